use super::element_type;
use crate::element::{Element, Precondition};
use crate::result::WatirResult;

element_type! {
    /// `<button>` or an `<input>` of type `button`, `reset`, `submit` or `image`
    Button => Button
}

impl Button {
    /// Caption: the `value` of an input button, the text of a `<button>`
    pub fn text(&self) -> WatirResult<String> {
        self.0.element_call(Precondition::WaitForExists, |native| {
            let driver = self.0.driver();
            if driver.tag_name(native)?.eq_ignore_ascii_case("input") {
                Ok(driver.attribute(native, "value")?.unwrap_or_default())
            } else {
                Ok(driver.text(native)?)
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::tests::{query, setup};
    use crate::browser::Container;
    use crate::driver::How;
    use crate::mock::MockNode;
    use crate::registry::ElementKind;
    use crate::selector;

    #[test]
    fn test_text_of_input_and_button() {
        let (mock, browser) = setup();
        let input = mock.add(MockNode::new("input").attr("type", "submit").attr("value", "Send"));
        let tag = mock.add(MockNode::new("button").text("Cancel"));
        mock.respond(How::XPath, query(ElementKind::Button, &selector!(id: "send")), vec![input]);
        mock.respond(How::XPath, query(ElementKind::Button, &selector!(id: "cancel")), vec![tag]);

        assert_eq!(browser.button(selector!(id: "send")).text().unwrap(), "Send");
        assert_eq!(browser.button(selector!(id: "cancel")).text().unwrap(), "Cancel");
    }

    #[test]
    fn test_click() {
        let (mock, browser) = setup();
        let node = mock.add(MockNode::new("button"));
        mock.respond(How::XPath, query(ElementKind::Button, &selector!(id: "go")), vec![node.clone()]);
        browser.button(selector!(id: "go")).click().unwrap();
        assert!(mock.was_called(&format!("click:{}", node.id())));
    }
}
