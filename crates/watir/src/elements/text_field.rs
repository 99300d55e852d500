use super::element_type;
use crate::element::{Attr, Element, ElementType, Precondition};
use crate::result::{WatirError, WatirResult};
use std::io;
use std::path::Path;

element_type! {
    /// `<input>` of a text-like type
    TextField => TextField
}

element_type! {
    /// `<textarea>`
    TextArea => TextArea
}

element_type! {
    /// `<input type="file">`
    FileField => FileField
}

/// Controls that take typed text and honor `readonly`
pub trait UserEditable: ElementType {
    /// Replace the content with `value`
    fn set(&self, value: &str) -> WatirResult<()> {
        let element = self.as_element();
        element.element_call(Precondition::WaitForPresent, |native| {
            element.assert_writable(native)?;
            element.driver().clear(native)?;
            Ok(element.driver().send_keys(native, value)?)
        })
    }

    /// Type `value` after the current content
    fn append(&self, value: &str) -> WatirResult<()> {
        self.as_element().send_keys(value)
    }

    /// Empty the control
    fn clear(&self) -> WatirResult<()> {
        let element = self.as_element();
        element.element_call(Precondition::WaitForPresent, |native| {
            element.assert_writable(native)?;
            Ok(element.driver().clear(native)?)
        })
    }

    /// Whether the `readonly` attribute is present
    fn readonly(&self) -> WatirResult<bool> {
        Ok(self.as_element().attribute_value("readonly")?.is_some())
    }
}

impl UserEditable for TextField {}
impl UserEditable for TextArea {}

impl FileField {
    /// Choose a file to upload; the file must exist locally
    pub fn set(&self, path: impl AsRef<Path>) -> WatirResult<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WatirError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let path = path.to_string_lossy();
        self.0.element_call(Precondition::WaitForExists, |native| {
            self.0.assert_enabled(native)?;
            Ok(self.0.driver().send_keys(native, &path)?)
        })
    }

    /// Chosen file name, empty when none
    pub fn value(&self) -> WatirResult<String> {
        Ok(self.attribute(Attr::Value)?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::tests::{query, setup};
    use super::*;
    use crate::browser::Container;
    use crate::driver::How;
    use crate::mock::MockNode;
    use crate::registry::ElementKind;
    use crate::selector;
    use std::io::Write;

    #[test]
    fn test_set_replaces_and_append_extends() {
        let (mock, browser) = setup();
        let node = mock.add(MockNode::new("input").attr("value", "old"));
        mock.respond(How::XPath, query(ElementKind::TextField, &selector!(name: "q")), vec![node.clone()]);

        let field = browser.text_field(selector!(name: "q"));
        field.set("rust").unwrap();
        assert_eq!(field.value().unwrap(), "rust");
        field.append(" lang").unwrap();
        assert_eq!(field.value().unwrap(), "rust lang");
        UserEditable::clear(&field).unwrap();
        assert_eq!(field.value().unwrap(), "");
        assert!(!field.readonly().unwrap());
    }

    #[test]
    fn test_readonly_textarea_rejects_set() {
        let (mock, browser) = setup();
        let node = mock.add(MockNode::new("textarea").attr("readonly", ""));
        mock.respond(How::XPath, query(ElementKind::TextArea, &selector!(id: "notes")), vec![node]);

        let notes = browser.textarea(selector!(id: "notes"));
        assert!(notes.readonly().unwrap());
        assert!(matches!(
            notes.set("x").unwrap_err(),
            WatirError::ObjectReadOnly { .. }
        ));
        assert!(!mock.was_called("clear:"));
    }

    #[test]
    fn test_file_field_requires_existing_file() {
        let (mock, browser) = setup();
        let node = mock.add(MockNode::new("input").attr("type", "file"));
        mock.respond(How::XPath, query(ElementKind::FileField, &selector!(name: "upload")), vec![node]);
        let upload = browser.file_field(selector!(name: "upload"));

        let missing = upload.set("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(missing, WatirError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "payload").unwrap();
        upload.set(file.path()).unwrap();
        assert_eq!(upload.value().unwrap(), file.path().to_string_lossy());
    }
}
