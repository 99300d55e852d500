use super::element_type;
use crate::element::{Element, Precondition};
use crate::result::WatirResult;

element_type! {
    /// `<input type="checkbox">`
    CheckBox => CheckBox
}

element_type! {
    /// `<input type="radio">`
    Radio => Radio
}

fn checked(element: &Element) -> WatirResult<bool> {
    element.element_call(Precondition::WaitForExists, |native| {
        Ok(element.driver().is_selected(native)?)
    })
}

impl CheckBox {
    /// Check (`true`) or uncheck (`false`); clicks only when the state differs
    pub fn set(&self, value: bool) -> WatirResult<()> {
        if self.is_set()? != value {
            self.0.click()?;
        }
        Ok(())
    }

    /// Uncheck
    pub fn clear(&self) -> WatirResult<()> {
        self.set(false)
    }

    /// Whether the box is checked
    pub fn is_set(&self) -> WatirResult<bool> {
        checked(&self.0)
    }
}

impl Radio {
    /// Select the radio button
    pub fn set(&self) -> WatirResult<()> {
        if !self.is_set()? {
            self.0.click()?;
        }
        Ok(())
    }

    /// Whether the radio button is selected
    pub fn is_set(&self) -> WatirResult<bool> {
        checked(&self.0)
    }
}
