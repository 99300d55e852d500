use super::element_type;
use crate::browser::Container;
use crate::collection::ElementCollection;
use crate::element::{Attr, Element, Precondition};
use crate::result::{WatirError, WatirResult};
use crate::selector::{Matcher, Selector};
use crate::wait::Wait;

element_type! {
    /// `<select>`
    Select => Select
}

element_type! {
    /// `<option>`
    SelectOption => SelectOption
}

/// Option attribute to match a requested value against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum By {
    Value,
    Text,
    Label,
}

impl By {
    const fn key(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Text => "text",
            Self::Label => "label",
        }
    }
}

impl Select {
    /// Every option of the list
    pub fn options(&self) -> ElementCollection<SelectOption> {
        Container::options(&self.0, Selector::new())
    }

    fn options_by(&self, by: By, value: &Matcher) -> ElementCollection<SelectOption> {
        Container::options(&self.0, Selector::new().with(by.key(), value.clone()))
    }

    /// Whether the list allows several selected options
    pub fn multiple(&self) -> WatirResult<bool> {
        Ok(self.attribute_value("multiple")?.is_some())
    }

    /// Select the option whose value, text or label (in that order) matches.
    ///
    /// Waits for a matching option to appear; returns the selected option's
    /// text.
    pub fn select(&self, value: impl Into<Matcher>) -> WatirResult<String> {
        let value = value.into();
        let found = self.find_options(&[By::Value, By::Text, By::Label], &value)?;
        self.select_matching(found)
    }

    /// Select the option whose value attribute matches
    pub fn select_value(&self, value: impl Into<Matcher>) -> WatirResult<String> {
        let value = value.into();
        let found = self.find_options(&[By::Value], &value)?;
        self.select_matching(found)
    }

    /// Select every option whose text or label matches; multi-selects only.
    ///
    /// Returns the text of the first selected option.
    pub fn select_all(&self, value: impl Into<Matcher>) -> WatirResult<String> {
        if !self.multiple()? {
            return Err(WatirError::invalid_state(
                "you can only use select_all on multi-selects",
            ));
        }
        let value = value.into();
        let found = self.find_options(&[By::Text, By::Label], &value)?;
        self.select_matching(found)
    }

    fn find_options(&self, order: &[By], value: &Matcher) -> WatirResult<Vec<SelectOption>> {
        // make sure the list itself exists before waiting on its options
        self.0.wait_for_exists()?;
        let options = self.0.session().config().wait_options();
        let mut found = Vec::new();
        let waited = Wait::until_ok(&options, "waiting for a matching option", || {
            for by in order {
                found = self.options_by(*by, value).to_vec()?;
                if !found.is_empty() {
                    return Ok(true);
                }
            }
            Ok(false)
        });
        match waited {
            Ok(_) => Ok(found),
            Err(err) if err.is_timeout() => Err(WatirError::NoValueFound {
                message: format!("{value} not found in {}", self.0),
            }),
            Err(err) => Err(err),
        }
    }

    fn select_matching(&self, mut found: Vec<SelectOption>) -> WatirResult<String> {
        if !self.multiple()? {
            found.truncate(1);
        }
        for option in &found {
            if !option.is_selected()? {
                option.0.click()?;
            }
        }
        match found.first() {
            Some(first) if !first.stale().unwrap_or(true) => first.text(),
            _ => Ok(String::new()),
        }
    }

    /// Currently selected options
    pub fn selected_options(&self) -> WatirResult<Vec<SelectOption>> {
        let mut selected = Vec::new();
        for option in self.options().iter()? {
            if option.is_selected()? {
                selected.push(option);
            }
        }
        Ok(selected)
    }

    /// Whether some option's text, label or value matches
    pub fn include(&self, value: impl Into<Matcher>) -> WatirResult<bool> {
        let value = value.into();
        for by in [By::Text, By::Label, By::Value] {
            if self.options_by(by, &value).exists()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether an option matching by text or label is selected.
    ///
    /// Fails with `UnknownObject` when no option matches at all.
    pub fn is_selected(&self, value: impl Into<Matcher>) -> WatirResult<bool> {
        let value = value.into();
        let mut matched = 0;
        for by in [By::Text, By::Label] {
            let options = self.options_by(by, &value).to_vec()?;
            matched += options.len();
            for option in options {
                if option.is_selected()? {
                    return Ok(true);
                }
            }
        }
        if matched == 0 {
            return Err(WatirError::unknown_object(format!(
                "unable to locate option matching {value}"
            )));
        }
        Ok(false)
    }

    /// Deselect everything; only multi-selects can be cleared
    pub fn clear(&self) -> WatirResult<()> {
        if !self.multiple()? {
            return Err(WatirError::invalid_state("you can only clear multi-selects"));
        }
        for option in self.selected_options()? {
            option.0.click()?;
        }
        Ok(())
    }

    /// Value of the first selected option
    pub fn value(&self) -> WatirResult<Option<String>> {
        self.selected_options()?
            .first()
            .map(SelectOption::value)
            .transpose()
    }

    /// Text of the first selected option
    pub fn text(&self) -> WatirResult<Option<String>> {
        self.selected_options()?
            .first()
            .map(|option| option.0.text())
            .transpose()
    }
}

impl SelectOption {
    /// Select the option
    pub fn select(&self) -> WatirResult<()> {
        self.0.click()
    }

    /// Deselect the option if it is selected
    pub fn clear(&self) -> WatirResult<()> {
        if self.is_selected()? {
            self.0.click()?;
        }
        Ok(())
    }

    /// Whether the option is selected
    pub fn is_selected(&self) -> WatirResult<bool> {
        self.0.element_call(Precondition::WaitForExists, |native| {
            Ok(self.0.driver().is_selected(native)?)
        })
    }

    /// `label` attribute, falling back to the text
    pub fn label(&self) -> WatirResult<String> {
        match self.attribute_value("label")? {
            Some(label) => Ok(label),
            None => self.0.text(),
        }
    }

    /// `value` attribute, falling back to the text
    pub fn value(&self) -> WatirResult<String> {
        match self.attribute(Attr::Value)? {
            Some(value) => Ok(value),
            None => self.0.text(),
        }
    }
}
