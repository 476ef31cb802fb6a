use batchcrab_api::batchcrab_core::adapter::OutputRecord;

/// `stream key value` line for a produced record, or `None` when the value
/// is not UTF-8.
pub fn format_output(record: &OutputRecord) -> Option<String> {
    let value = record.value_str()?;
    Some(format!("{} {} {}", record.stream, record.key, value))
}

#[cfg(test)]
#[path = "tests/output_tests.rs"]
mod tests;
