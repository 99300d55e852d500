//! End-to-end scenarios through the public DSL against the scripted driver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use regex::Regex;
use std::io::Write;
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use watir::prelude::*;
use watir::xpath;
use watir::{How, MockDriver, MockNode, NativeRef, SelectorBuilder};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("watir=debug"))
            .with_test_writer()
            .try_init();
    });
}

fn setup() -> (Arc<MockDriver>, Browser) {
    init_tracing();
    let mock = Arc::new(MockDriver::new());
    let browser = Browser::with_config(mock.clone(), Config::new().with_default_timeout(0.0));
    (mock, browser)
}

fn query(kind: ElementKind, selector: &Selector) -> String {
    SelectorBuilder::new(kind)
        .build(selector)
        .unwrap()
        .query()
        .unwrap()
        .1
        .to_string()
}

mod resolver_scenarios {
    use super::*;

    #[test]
    fn test_equality_selector_is_one_server_side_query() {
        let strategy = SelectorBuilder::new(ElementKind::Button)
            .build(&selector!(id: "save", class: "primary"))
            .unwrap();
        assert!(strategy.is_server_side());
        let (how, q) = strategy.query().unwrap();
        assert_eq!(how, How::XPath);
        assert!(q.contains("@id='save'"));
        assert!(q.contains("contains(concat(' ',@class,' '),' primary ')"));
    }

    #[test]
    fn test_regex_filter_matches_in_process_filtering() {
        let (mock, browser) = setup();
        let sel = selector!(text: Regex::new("^Save").unwrap());
        let strategy = SelectorBuilder::new(ElementKind::Button).build(&sel).unwrap();
        assert!(!strategy.is_server_side());

        let labels = ["Save", "Cancel", "Save as", "Unsave"];
        let refs: Vec<NativeRef> = labels
            .iter()
            .map(|t| mock.add(MockNode::new("button").text(*t)))
            .collect();
        mock.respond(How::XPath, query(ElementKind::Button, &sel), refs.clone());

        let found: Vec<_> = browser
            .buttons(sel)
            .to_vec()
            .unwrap()
            .iter()
            .map(|b| b.native().unwrap())
            .collect();
        let expected: Vec<_> = labels
            .iter()
            .zip(&refs)
            .filter(|(t, _)| t.starts_with("Save"))
            .map(|(_, r)| r.clone())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_apostrophes_are_escaped_with_concat() {
        assert_eq!(xpath::escape("it's a test"), "concat('it',\"'\",'s a test')");
        let (_, q) = SelectorBuilder::new(ElementKind::HtmlElement)
            .build(&selector!(title: "it's"))
            .unwrap()
            .query()
            .map(|(h, q)| (h, q.to_string()))
            .unwrap();
        assert!(q.contains("concat('it',\"'\",'s')"));
    }
}

mod lifecycle_scenarios {
    use super::*;

    #[test]
    fn test_login_flow() {
        let (mock, browser) = setup();
        browser.goto("https://example.com/login").unwrap();

        let form = mock.add(MockNode::new("form").attr("id", "login"));
        let user = mock.add(MockNode::new("input").attr("name", "user"));
        let remember = mock.add(MockNode::new("input").attr("type", "checkbox"));
        let submit = mock.add(MockNode::new("button").text("Sign in"));
        mock.respond(How::XPath, query(ElementKind::Form, &selector!(id: "login")), vec![form.clone()]);
        mock.respond_within(&form, How::XPath, query(ElementKind::TextField, &selector!(name: "user")), vec![user.clone()]);
        mock.respond_within(&form, How::XPath, query(ElementKind::CheckBox, &selector!(name: "remember")), vec![remember.clone()]);
        mock.respond_within(&form, How::XPath, query(ElementKind::Button, &selector!(text: "Sign in")), vec![submit.clone()]);

        let login = browser.form(selector!(id: "login"));
        login.text_field(selector!(name: "user")).set("ferris").unwrap();
        login.checkbox(selector!(name: "remember")).set(true).unwrap();
        login.button(selector!(text: "Sign in")).click().unwrap();

        assert_eq!(mock.node(&user).unwrap().attributes.get("value").map(String::as_str), Some("ferris"));
        assert!(mock.node(&remember).unwrap().selected);
        assert!(mock.was_called(&format!("click:{}", submit.id())));
    }

    #[test]
    fn test_handle_survives_a_rerender() {
        let (mock, browser) = setup();
        let sel = selector!(class: "status");
        let q = query(ElementKind::HtmlElement, &sel);
        let before = mock.add(MockNode::new("p").text("loading"));
        mock.respond(How::XPath, q.clone(), vec![before.clone()]);

        let status = browser.element(sel);
        assert_eq!(status.text().unwrap(), "loading");

        mock.detach(&before);
        let after = mock.add(MockNode::new("p").text("ready"));
        mock.respond(How::XPath, q, vec![after.clone()]);

        assert_eq!(status.text().unwrap(), "ready");
        assert_eq!(status.native(), Some(after));
    }

    #[test]
    fn test_rerender_without_relocation_surfaces_unknown_object() {
        let (mock, browser) = setup();
        browser.set_always_locate(false);
        let sel = selector!(class: "status");
        let q = query(ElementKind::HtmlElement, &sel);
        let before = mock.add(MockNode::new("p").text("loading"));
        mock.respond(How::XPath, q.clone(), vec![before.clone()]);

        let status = browser.element(sel);
        status.text().unwrap();
        mock.detach(&before);
        let after = mock.add(MockNode::new("p").text("ready"));
        mock.respond(How::XPath, q, vec![after]);

        assert!(matches!(status.text().unwrap_err(), WatirError::UnknownObject { .. }));
        assert_eq!(status.text().unwrap(), "ready");
    }

    #[test]
    fn test_disabled_button_is_not_clicked() {
        let (mock, browser) = setup();
        let node = mock.add(MockNode::new("button").disabled());
        mock.respond(How::XPath, query(ElementKind::Button, &selector!(id: "go")), vec![node]);
        let err = browser.button(selector!(id: "go")).click().unwrap_err();
        assert!(matches!(err, WatirError::ObjectDisabled { .. }));
        assert!(!mock.was_called("click:"));
    }

    #[test]
    fn test_zero_timeout_never_sleeps() {
        let (_, browser) = setup();
        let start = Instant::now();
        for _ in 0..20 {
            assert!(browser.element(selector!(id: "absent")).click().is_err());
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}

mod collection_scenarios {
    use super::*;

    #[test]
    fn test_mixed_inputs_and_out_of_range_index() {
        let (mock, browser) = setup();
        let refs = vec![
            mock.add(MockNode::new("input").attr("type", "text")),
            mock.add(MockNode::new("input").attr("type", "radio")),
            mock.add(MockNode::new("input").attr("type", "image")),
        ];
        mock.respond(How::XPath, query(ElementKind::Input, &Selector::new()), refs);

        let inputs = browser.inputs(Selector::new());
        let kinds: Vec<_> = inputs.iter().unwrap().map(|i| i.kind()).collect();
        assert_eq!(kinds, [ElementKind::TextField, ElementKind::Radio, ElementKind::Button]);

        let beyond = inputs.at(9);
        assert_eq!(beyond.selector().index(), Some(9));
        assert!(!beyond.exists().unwrap());
    }
}

mod context_scenarios {
    use super::*;

    #[test]
    fn test_popup_window_and_frame() {
        let (mock, browser) = setup();
        let main = mock.current_window();
        mock.add_window("popup", "Help", "https://example.com/help");

        let help = browser.window(selector!(title: "Help")).unwrap();
        help.use_window().unwrap();
        assert_eq!(browser.title().unwrap(), "Help");

        let frame = mock.add(MockNode::new("iframe"));
        mock.respond(How::XPath, query(ElementKind::IFrame, &selector!(name: "content")), vec![frame.clone()]);
        let para = mock.add_in_frame(&frame, MockNode::new("p").text("framed help"));
        mock.respond_in_frame(&frame, How::XPath, query(ElementKind::HtmlElement, &selector!(index: 0)), vec![para]);

        let text = browser
            .iframe(selector!(name: "content"))
            .element(selector!(index: 0))
            .text()
            .unwrap();
        assert_eq!(text, "framed help");

        help.close().unwrap();
        browser.original_window().unwrap().use_window().unwrap();
        assert_eq!(mock.current_window(), main);
        assert!(matches!(
            browser.window(selector!(title: "Help")).unwrap().use_window().unwrap_err(),
            WatirError::NoMatchingWindowFound { .. }
        ));
    }

    #[test]
    fn test_window_selector_rejects_element_keys() {
        let (_, browser) = setup();
        assert!(matches!(
            browser.window(selector!(id: "x")).unwrap_err(),
            WatirError::InvalidSelector { .. }
        ));
    }
}

mod config_scenarios {
    use super::*;

    #[test]
    fn test_yaml_config_drives_a_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_timeout: 0\nalways_locate: false").unwrap();
        let config = Config::from_path(file.path()).unwrap();
        assert!(!config.always_locate);

        let mock = Arc::new(MockDriver::new());
        let browser = Browser::with_config(mock, config.clone());
        assert_eq!(browser.config(), config);
    }

    #[test]
    fn test_invalid_yaml_config_is_a_config_error() {
        assert!(matches!(
            Config::from_yaml_str("default_timeout: -3").unwrap_err(),
            WatirError::Config { .. }
        ));
    }
}
