use super::*;

#[test]
fn it_splits_fenced_code_from_prose() {
    let message = Message::new(
        Role::Assistant,
        "Fit summary:\n```\namp = 0.8\ne0 = 1.2\n```\nDone.",
    );

    assert_eq!(
        message.content,
        vec![
            MessagePart::Text {
                text: "Fit summary:".to_string()
            },
            MessagePart::Code {
                text: "amp = 0.8\ne0 = 1.2".to_string()
            },
            MessagePart::Text {
                text: "Done.".to_string()
            },
        ]
    );
    assert_eq!(message.codeblocks(), vec!["amp = 0.8\ne0 = 1.2".to_string()]);
}

#[test]
fn it_keeps_an_unterminated_fence_as_text() {
    let message = Message::new(Role::Assistant, "```\nhalf");
    assert_eq!(message.codeblocks().len(), 0);
    assert_eq!(message.text(), "```\nhalf");
}

#[test]
fn it_keeps_empty_text_as_one_part() {
    let message = Message::new(Role::User, "");
    assert_eq!(message.content.len(), 1);
    assert_eq!(message.text(), "");
}

#[test]
fn it_replaces_tabs() {
    let message = Message::new(Role::User, "a\tb");
    assert_eq!(message.text(), "a  b");
}

#[test]
fn it_applies_patches() {
    let provisional = Message::new_with_type(Role::Assistant, MessageType::Provisional, "wait");
    assert!(provisional.is_provisional());

    let patched = provisional.apply(&MessagePatch::error("Request cancelled."));
    assert!(patched.is_error());
    assert_eq!(patched.role, Role::Assistant);
    assert_eq!(patched.text(), "Request cancelled.");

    // The source message is untouched.
    assert_eq!(provisional.text(), "wait");
}
