//! Fixed test layout
//!
//! Pure composition: sections go into a fixed order and absent sections
//! leave no line behind. The result is handed to the formatter.

use crate::error::Result;
use crate::format;
use crate::scaffold::ScaffoldFields;

/// Substitute `fields` into the layout, unformatted.
pub fn layout(fields: &ScaffoldFields) -> String {
    let signature = format!("func {}(t *testing.T) {{", fields.test_func_name);
    let sections: [Option<&str>; 16] = [
        Some(&signature),
        fields.parallel.as_deref(),
        fields.cleanup.as_deref(),
        fields.input_struct.as_deref(),
        fields.expected_struct.as_deref(),
        Some(&fields.test_cases_def),
        Some("for _, test := range tests {"),
        fields.loop_rebind.as_deref(),
        Some("t.Run(test.Name, func(t *testing.T) {"),
        fields.parallel.as_deref(),
        fields.cleanup.as_deref(),
        Some(&fields.exec_base_func),
        fields.asserts.as_deref(),
        Some("})"),
        Some("}"),
        Some("}"),
    ];

    let mut buffer = String::new();
    for section in sections.into_iter().flatten().filter(|s| !s.is_empty()) {
        buffer.push_str(section);
        buffer.push('\n');
    }
    buffer
}

/// Layout plus normalization; fails with the unformatted buffer attached.
pub fn render(fields: &ScaffoldFields) -> Result<String> {
    format::normalize(&layout(fields))
}
