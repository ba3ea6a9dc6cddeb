use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Array(Vec<Value>),
    Nil,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(x) => write!(f, "{}", x),
            Value::Number(x) => write!(f, "{}", render_number(*x)),
            Value::String(x) => write!(f, "{}", x),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Integral values print without a decimal point; everything else prints at
// six places with trailing zeros (and a bare '.') stripped.
fn render_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        return format!("{}", x as i64);
    }
    let mut text = format!("{:.6}", x);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    text
}
