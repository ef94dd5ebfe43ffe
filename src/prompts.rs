//! Instruction prompt for restructuring extracted tables into a rent roll.
//!
//! The prompt is the only contract the model sees: it defines the
//! `rentRollSummary` shape that [`crate::pipeline::postprocess`] later
//! validates. Keeping it here lets tests inspect it without a live model.

/// Placeholder replaced by the nested-array JSON of the extracted tables.
pub const TABLE_DATA_PLACEHOLDER: &str = "{table_data}";

/// Rent-roll restructuring prompt. Sent as a single system message.
pub const RENT_ROLL_PROMPT: &str = r#"Given the following table data:
{table_data}

Instructions:
1. Extract the rent roll table data.
2. Create an array named rentRollSummary.
3. Clean and format the extracted data to handle line breaks and other formatting issues appropriately.
4. For each row in the table:
   - Create a sub-array representing the row.
   - For each column in the row:
     - Create an object with three fields: key, value, and type.
     - Assign the key as the column header.
     - Assign the value as the corresponding cell value in the row.
     - Determine the type of the value (string, number, etc.).
     - If the value has a $ sign, keep the $ sign in the value and give its type as currency.
     - Append the object to the sub-array.
   - Append the sub-array to the rentRollSummary array.
5. If there is a total annual revenue or any other total value given:
   - Create a new sub-array representing the totals row.
   - For each total value:
     - Create an object with three fields: key, value, and type.
     - Assign the key as the name of the total value (e.g., Total Annual Revenue).
     - Assign the value as the total value.
     - Determine the type of the value (string, number, currency, etc.).
     - Append the object to the sub-array.
   - Append the sub-array to the rentRollSummary array.
6. Generate a JSON object of the form {"rentRollSummary": [[{"key": ..., "value": ..., "type": ...}, ...], ...]} containing every row and total sub-array.

Note: Handle any line breaks and formatting issues in the extracted data so the JSON is accurate. Do not include any additional information or comments in the response. Do not wrap the JSON in code fences. Ensure the output is complete and does not contain ellipsis (...)."#;

/// Build the rent-roll prompt around the serialised tables.
pub fn rent_roll_prompt(table_json: &str) -> String {
    RENT_ROLL_PROMPT.replacen(TABLE_DATA_PLACEHOLDER, table_json, 1)
}

/// Follow-up instruction sent after a reply that could not be parsed.
pub fn malformed_reply_reminder(detail: &str) -> String {
    format!(
        "Your previous reply could not be parsed as the requested JSON ({detail}). \
Reply again with only the complete JSON object, no commentary, no code fences, no ellipsis."
    )
}
