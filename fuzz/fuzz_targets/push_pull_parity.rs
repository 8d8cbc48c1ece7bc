#![no_main]

use libfuzzer_sys::fuzz_target;
use template::debug::{event_lines, pull_event_lines};
use template::{Recorder, WriterConfig, attribute, element};

const NAMES: [template::ElementName; 8] = [
    element::DIV,
    element::SPAN,
    element::P,
    element::BR,
    element::SCRIPT,
    element::UL,
    element::EM,
    element::IMG,
];
const ATTRS: [template::AttributeName; 4] =
    [attribute::ID, attribute::CLASS, attribute::TITLE, attribute::HIDDEN];
const MAX_DEPTH: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Element,
    Fragment,
}

fuzz_target!(|data: &[u8]| {
    let mut recorder = Recorder::new();
    let mut levels: Vec<Level> = Vec::new();
    let mut bytes = data.iter().copied();
    while let Some(op) = bytes.next() {
        let arg = bytes.next().unwrap_or(0);
        match op % 8 {
            0 if levels.len() < MAX_DEPTH => {
                let name = NAMES[arg as usize % NAMES.len()];
                recorder.open_element(name);
                if recorder.names().element_kind(name).is_void {
                    recorder.close_element();
                } else {
                    levels.push(Level::Element);
                }
            }
            1 => match levels.pop() {
                Some(Level::Element) => {
                    recorder.close_element();
                }
                Some(Level::Fragment) => {
                    recorder.fragment_end();
                }
                None => {}
            },
            2 => {
                recorder.text(&"<&>\"x".repeat(arg as usize % 3));
            }
            3 => {
                recorder.raw("<!-- raw -->");
            }
            4 | 5 if recorder.depth() > 0 => {
                let name = ATTRS[arg as usize % ATTRS.len()];
                if op % 8 == 4 {
                    recorder.attribute(name, &format!("v{}&{}", arg, arg % 7));
                } else {
                    recorder.boolean_attribute(name);
                }
            }
            6 if levels.len() < MAX_DEPTH => {
                recorder.fragment_begin();
                levels.push(Level::Fragment);
            }
            7 => {
                recorder.doctype();
            }
            _ => {}
        }
    }
    while let Some(level) = levels.pop() {
        match level {
            Level::Element => {
                recorder.close_element();
            }
            Level::Fragment => {
                recorder.fragment_end();
            }
        }
    }
    let html = recorder.finish().compile();
    assert_eq!(event_lines(&html), pull_event_lines(&html));
    let minified = html.to_string();
    let pretty = html.display(WriterConfig::pretty()).to_string();
    assert!(pretty.len() >= minified.len());
});

