//! Prompt templates sent to the text models.

pub const TOPIC_SUGGESTION: &str = include_str!("../data/prompts/topic_suggestion.txt");
pub const POST: &str = include_str!("../data/prompts/post.txt");
pub const IMAGE_PROMPT: &str = include_str!("../data/prompts/image_prompt.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

pub fn build_topic_suggestion_prompt() -> String {
    TOPIC_SUGGESTION.to_string()
}

/// `topic` must be non-empty; callers validate it first.
pub fn build_post_prompt(topic: &str) -> String {
    debug_assert!(!topic.trim().is_empty(), "post prompt needs a topic");
    render(POST, &[("topic", topic)])
}

/// `post_text` must be non-empty; it only exists after a successful post call.
pub fn build_image_prompt_request(post_text: &str) -> String {
    debug_assert!(!post_text.trim().is_empty(), "image prompt needs post text");
    render(IMAGE_PROMPT, &[("post", post_text)])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION_MARKERS: [&str; 5] = [
        "HOOK",
        "VALUE DEVELOPMENT",
        "ACTIONABLE STEPS",
        "CLOSING CALL-TO-ACTION",
        "HASHTAGS",
    ];

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{{a}} {{b}}", &[("a", "x")]), "x {{b}}");
    }

    #[test]
    fn test_templates_have_placeholders() {
        assert!(POST.contains("{{topic}}"));
        assert!(IMAGE_PROMPT.contains("{{post}}"));
        assert!(!TOPIC_SUGGESTION.contains("{{"));
    }

    #[test]
    fn test_topic_suggestion_is_fixed() {
        let prompt = build_topic_suggestion_prompt();
        assert_eq!(prompt, build_topic_suggestion_prompt());
        assert!(prompt.contains("ONE idea"));
        assert!(prompt.contains("no quotes"));
    }

    #[test]
    fn test_post_prompt_embeds_topic_and_sections() {
        let topics = [
            "IA para pymes",
            "Cómo auditar tu trabajo con \"agentes\"",
            "a",
            "Topic with {{braces}} and $pecial chars",
        ];
        for topic in topics {
            let prompt = build_post_prompt(topic);
            assert!(prompt.contains(topic), "topic missing: {}", topic);
            for marker in SECTION_MARKERS {
                assert!(prompt.contains(marker), "marker {} missing", marker);
            }
            assert!(!prompt.contains("{{topic}}"));
        }
    }

    #[test]
    fn test_post_prompt_demands_plain_text() {
        let prompt = build_post_prompt("Productividad");
        assert!(prompt.contains("Plain text only"));
        assert!(prompt.contains("voseo"));
    }

    #[test]
    fn test_image_prompt_request_constrains_styles() {
        let post = "Automatizá tus reportes semanales.\n\n#IA";
        let prompt = build_image_prompt_request(post);

        assert!(prompt.contains(post));
        assert!(prompt.contains("Clean vector illustration"));
        assert!(prompt.contains("Conceptual photography"));
        assert!(prompt.contains("Subtle 3D iconography"));
        assert!(prompt.contains("futuristic, sci-fi"));
        assert!(prompt.contains("one single final prompt"));
    }
}
