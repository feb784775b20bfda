//! Rendering search results as Slack attachments.

use crate::search::SearchResult;
use crate::slack::{Attachment, Field};

/// Describe an EC2 instance in a single attachment.
pub fn format_ec2_instance(instance: &SearchResult) -> Attachment {
    let text = format!(
        "Instance <{}|{}> is a `{}` `{}` in `{}`",
        instance.link("ec2_console"),
        instance.metadata("instance_id"),
        instance.metadata("instance_state"),
        instance.metadata("instance_type"),
        instance.metadata("az"),
    );

    Attachment {
        fallback: text.clone(),
        text,
        fields: vec![
            short_field("Environment", instance.metadata("tag:Environment")),
            short_field("Role", instance.metadata("tag:Role")),
            short_field("Public IP(s)", instance.metadata("public_ips")),
            short_field("Private IP(s)", instance.metadata("private_ips")),
            Field {
                title: String::new(),
                value: format!(
                    "⏳ <{}|AWS config timeline>",
                    instance.link("config_timeline")
                ),
                short: false,
            },
        ],
        markdown_in: vec!["text".to_string()],
        ..Default::default()
    }
}

fn short_field(title: &str, value: String) -> Field {
    Field {
        title: title.to_string(),
        value,
        short: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ec2::tests::INSTANCE_ID;
    use std::collections::HashMap;

    fn instance() -> SearchResult {
        SearchResult {
            kind: "ec2.instance".to_string(),
            metadata: HashMap::from([
                ("instance_id".to_string(), vec![INSTANCE_ID.to_string()]),
                ("instance_state".to_string(), vec!["running".to_string()]),
                ("instance_type".to_string(), vec!["t3.micro".to_string()]),
                ("az".to_string(), vec!["us-east-1a".to_string()]),
                ("tag:Role".to_string(), vec!["web".to_string()]),
                (
                    "private_ips".to_string(),
                    vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
                ),
            ]),
            links: HashMap::from([
                ("ec2_console".to_string(), "https://console/ec2".to_string()),
                ("config_timeline".to_string(), "https://console/config".to_string()),
            ]),
        }
    }

    #[test]
    fn test_format_ec2_instance_text() {
        let attachment = format_ec2_instance(&instance());

        assert_eq!(
            attachment.text,
            "Instance <https://console/ec2|i-0123456789abcdef0> is a `running` `t3.micro` in `us-east-1a`"
        );
        assert_eq!(attachment.markdown_in, vec!["text".to_string()]);
    }

    #[test]
    fn test_format_ec2_instance_fields() {
        let attachment = format_ec2_instance(&instance());

        let titles: Vec<&str> = attachment.fields.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Environment", "Role", "Public IP(s)", "Private IP(s)", ""]
        );
        assert_eq!(attachment.fields[0].value, "");
        assert_eq!(attachment.fields[1].value, "web");
        assert_eq!(attachment.fields[3].value, "10.0.0.1, 10.0.0.2");
        assert!(attachment.fields[4].value.contains("https://console/config"));
        assert!(!attachment.fields[4].short);
    }
}
