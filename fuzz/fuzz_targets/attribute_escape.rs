#![no_main]

use libfuzzer_sys::fuzz_target;
use template::{escape_attribute_value, escape_text};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let value = escape_attribute_value(input);
    assert!(!value.contains(['"', '\'', '<', '>']), "unescaped quote or bracket in {value:?}");
    // Every `&` left in the output starts an entity, so escaping again is a no-op.
    assert_eq!(escape_attribute_value(&value), value);

    let text = escape_text(input);
    assert!(!text.contains(['<', '>']), "unescaped bracket in {text:?}");
    let entities = ["&amp;", "&lt;", "&gt;"]
        .iter()
        .map(|e| text.matches(e).count())
        .sum::<usize>();
    assert_eq!(text.matches('&').count(), entities);
});
