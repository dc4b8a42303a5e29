//! Scaffold assembly
//!
//! All decisions about what the generated test contains are made here.
//! Sections are plain, unindented lines; indentation and alignment are
//! rebuilt by the formatter.

use crate::naming::upper_first;
use crate::signature::{BaseFunctionData, VarField};

/// Rendered text of every section of the test layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldFields {
    pub test_func_name: String,
    pub input_struct: Option<String>,
    pub expected_struct: Option<String>,
    pub test_cases_def: String,
    /// `test := test` ahead of `t.Run` in parallel mode
    pub loop_rebind: Option<String>,
    pub exec_base_func: String,
    pub asserts: Option<String>,
    pub parallel: Option<String>,
    pub cleanup: Option<String>,
}

pub fn assemble(data: &BaseFunctionData<'_>, parallel: bool) -> ScaffoldFields {
    ScaffoldFields {
        test_func_name: test_func_name(&data.decl.name),
        input_struct: struct_def("input", &data.params),
        expected_struct: struct_def("expected", &data.results),
        test_cases_def: test_cases_def(data),
        loop_rebind: parallel.then(|| "test := test".to_string()),
        exec_base_func: exec_base_func(data),
        asserts: asserts(data),
        parallel: parallel.then(|| "t.Parallel()".to_string()),
        cleanup: parallel.then(|| "t.Cleanup(func() {})".to_string()),
    }
}

pub fn test_func_name(function: &str) -> String {
    format!("Test{}", upper_first(function))
}

fn struct_def(type_name: &str, fields: &[VarField]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let mut lines = vec![format!("type {} struct {{", type_name)];
    lines.extend(fields.iter().map(|f| format!("{} {}", f.name, f.type_label)));
    lines.push("}".to_string());
    Some(lines.join("\n"))
}

fn test_cases_def(data: &BaseFunctionData<'_>) -> String {
    let mut lines = vec!["tests := []struct {".to_string(), "Name string".to_string()];
    if let Some(receiver) = &data.receiver {
        lines.push(format!("Use {}", receiver.type_label));
    }
    if !data.params.is_empty() {
        lines.push("Input input".to_string());
    }
    if !data.results.is_empty() {
        lines.push("Expected expected".to_string());
    }
    if data.result_error_count > 0 {
        lines.push("wantError bool".to_string());
    }
    if data.receiver_mutated {
        if let Some(receiver) = &data.receiver {
            lines.push(format!("UseExpected {}", receiver.type_label));
        }
    }
    lines.push("}{}".to_string());
    lines.join("\n")
}

fn exec_base_func(data: &BaseFunctionData<'_>) -> String {
    let mut call = String::new();
    if !data.results.is_empty() {
        let names: Vec<&str> = data.results.iter().map(|r| r.name.as_str()).collect();
        call.push_str(&names.join(", "));
        call.push_str(" := ");
    }
    if data.receiver.is_some() {
        call.push_str("test.Use.");
    }
    let args: Vec<String> = data
        .params
        .iter()
        .map(|p| {
            let spread = if p.variadic { "..." } else { "" };
            format!("test.Input.{}{}", p.name, spread)
        })
        .collect();
    call.push_str(&format!("{}({})", data.decl.name, args.join(", ")));
    call
}

/// Error checks first, then equality on the other results, then the
/// receiver comparison.
fn asserts(data: &BaseFunctionData<'_>) -> Option<String> {
    let mut lines = Vec::new();
    for result in data.results.iter().filter(|r| r.is_error_like) {
        let name = &result.name;
        lines.push("if test.wantError {".to_string());
        lines.push(format!("assert.Error(t, {})", name));
        lines.push(format!("if test.Expected.{} != nil {{", name));
        lines.push(format!(
            "assert.EqualError(t, {}, test.Expected.{}.Error())",
            name, name
        ));
        lines.push("}".to_string());
        lines.push("} else {".to_string());
        lines.push(format!("assert.NoError(t, {})", name));
        lines.push("}".to_string());
    }
    for result in data.results.iter().filter(|r| !r.is_error_like) {
        lines.push(format!(
            "assert.Equal(t, test.Expected.{}, {})",
            result.name, result.name
        ));
    }
    if data.receiver_mutated {
        lines.push("assert.Equal(t, test.UseExpected, test.Use)".to_string());
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}
