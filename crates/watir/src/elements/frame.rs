use super::element_type;
use crate::browser::{Container, QueryScope};
use crate::context::{run_script, Scope, ScriptValue};
use crate::driver::{DriverError, ScriptArg};
use crate::element::Element;
use crate::result::{WatirError, WatirResult};
use std::sync::Arc;

element_type! {
    /// `<iframe>` or `<frame>`; queries through it run in the frame's document
    IFrame => IFrame
}

impl IFrame {
    fn frame_error(&self) -> WatirError {
        WatirError::UnknownFrame {
            message: self.0.selector_string(),
        }
    }

    /// Make the frame's document the driver's current context.
    ///
    /// Enclosing frames are entered first. A frame element that is gone, or
    /// that the driver refuses to enter, is reported as `UnknownFrame`.
    pub fn switch_to(&self) -> WatirResult<()> {
        let native = match self.0.assert_exists() {
            Err(err) if err.is_not_found() => return Err(self.frame_error()),
            other => other?,
        };
        match self.0.driver().switch_to_frame(&native) {
            Ok(()) => {
                self.0.session().entered_frame();
                tracing::trace!(frame = %native, "switched to frame");
                Ok(())
            }
            Err(DriverError::NoSuchFrame(_) | DriverError::StaleElementReference) => {
                self.0.reset();
                Err(self.frame_error())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Run a script inside the frame's document
    pub fn execute_script(&self, script: &str, args: &[ScriptArg]) -> WatirResult<ScriptValue> {
        run_script(
            self.0.session(),
            &Scope::Frame(Box::new(self.clone())),
            script,
            args,
        )
    }
}

impl Container for IFrame {
    fn query_scope(&self) -> QueryScope {
        QueryScope::new(
            Arc::clone(self.0.session()),
            Scope::Frame(Box::new(self.clone())),
        )
    }
}
