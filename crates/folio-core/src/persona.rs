//! System instruction for drafting replies in the owner's voice.

use std::fmt::Write as _;

use crate::profile::UserProfile;
use crate::skills::Pivot;

const ROLE: &str = "You draft replies, direct messages, and emails on behalf of a software \
engineer, written in their voice. Produce the single best message for the request.";

const RULES: &str = "\
1. Transitive knowledge: treat a library as evidence of the technology beneath it \
(boto3 means AWS, mongoose means MongoDB, pg means PostgreSQL).
2. Pivot, never fabricate: do not claim any skill listed under missing skills. State the gap \
plainly, then lead with the closest owned skill and explain what transfers.
3. Equivalents: a project built on an equivalent technology may be cited if the difference is \
named (\"I used PostgreSQL rather than MongoDB\").
4. Evidence: cite only projects that appear in the knowledge base excerpts. Never invent \
projects, employers, or numbers.
5. Tone: terse and confident. Prefer concrete, checkable claims about what was built and with \
what over adjectives.
6. DMs and emails: open with something specific to the recipient, show fit with one or two \
concrete projects, end with a clear next step, and include the profile links when relevant.";

/// Build the generation system instruction.
///
/// `pivots` lists the requested skills the knowledge base does not support,
/// each with owned substitutes (possibly none).
#[must_use]
pub fn system_prompt(
    profile: &UserProfile,
    context: &str,
    pivots: &[Pivot],
    query: &str,
) -> String {
    let mut prompt = String::with_capacity(context.len() + 2048);
    prompt.push_str(ROLE);

    prompt.push_str("\n\n## Profile\n");
    prompt.push_str(&profile.to_prompt_json());

    prompt.push_str("\n\n## Knowledge base excerpts\n");
    if context.trim().is_empty() {
        prompt.push_str("(nothing retrieved)");
    } else {
        prompt.push_str(context);
    }

    prompt.push_str("\n\n## Missing skills\n");
    if pivots.is_empty() {
        prompt.push_str("None.");
    } else {
        for pivot in pivots {
            let _ = write!(prompt, "- {}", pivot.missing);
            if pivot.substitutes.is_empty() {
                prompt.push_str(" (no owned equivalent; emphasise adaptability)");
            } else {
                let _ = write!(prompt, " (closest owned: {})", pivot.substitutes.join(", "));
            }
            prompt.push('\n');
        }
        let names: Vec<&str> = pivots.iter().map(|p| p.missing.as_str()).collect();
        let _ = write!(prompt, "Do not claim experience with: {}.", names.join(", "));
    }

    prompt.push_str("\n\n## Rules\n");
    prompt.push_str(RULES);

    let _ = write!(prompt, "\n\n## Task\nWrite the response for: \"{query}\"");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_section_names_gap_and_substitute() {
        let profile = UserProfile {
            skills: vec!["PostgreSQL".into()],
            ..UserProfile::default()
        };
        let pivots = vec![Pivot {
            missing: "MongoDB".into(),
            substitutes: vec!["PostgreSQL".into()],
        }];
        let prompt = system_prompt(
            &profile,
            "Skills used in api: pg",
            &pivots,
            "DM about MongoDB",
        );

        assert!(prompt.contains("- MongoDB (closest owned: PostgreSQL)"));
        assert!(prompt.contains("Do not claim experience with: MongoDB."));
        assert!(prompt.contains(r#"Write the response for: "DM about MongoDB""#));
        assert!(prompt.contains(r#""skills":["PostgreSQL"]"#));
    }

    #[test]
    fn sections_appear_in_order() {
        let prompt = system_prompt(&UserProfile::default(), "ctx", &[], "q");
        let order = [
            "## Profile",
            "## Knowledge base excerpts",
            "## Missing skills",
            "## Rules",
            "## Task",
        ];
        let positions: Vec<usize> = order.iter().map(|h| prompt.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.contains("## Missing skills\nNone."));
    }

    #[test]
    fn empty_context_is_marked() {
        let prompt = system_prompt(&UserProfile::default(), "  ", &[], "q");
        assert!(prompt.contains("(nothing retrieved)"));
    }

    #[test]
    fn missing_without_substitute() {
        let pivots = vec![Pivot {
            missing: "Kubernetes".into(),
            substitutes: Vec::new(),
        }];
        let prompt = system_prompt(&UserProfile::default(), "ctx", &pivots, "q");
        assert!(prompt.contains("- Kubernetes (no owned equivalent"));
    }
}
