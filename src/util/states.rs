/// Brazilian federative units, in the order used on every state picker.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB",
    "PE", "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// Returns the canonical upper-case code if `raw` names a known state.
pub fn normalize_uf(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    UFS.contains(&code.as_str()).then_some(code)
}
