/// A value that can appear as a Ruby literal in emitted source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Literal {
    pub fn to_ruby(&self) -> String {
        match self {
            Literal::Number(v) => format_num(*v),
            Literal::Text(s) => quote_str(s),
            Literal::Bool(b) => b.to_string(),
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value as f64)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

/// Wraps `s` in double quotes, escaping only `"`. Backslashes pass through as-is.
pub fn quote_str(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

pub fn serialize_scalar(value: &Literal) -> String {
    value.to_ruby()
}

pub fn serialize_sequence(values: &[Literal]) -> String {
    let items = values.iter().map(serialize_scalar).collect::<Vec<_>>();
    format!("[{}]", items.join(", "))
}

pub fn format_num(v: f64) -> String {
    if v.is_nan() {
        return "Float::NAN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 {
            "Float::INFINITY".to_string()
        } else {
            "-Float::INFINITY".to_string()
        };
    }
    // i64 covers every integral value below 2^63 exactly.
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
