use super::native::NativeType;

/// A parameter attached to a [`Command`], ready for the driver.
///
/// `native_type` of `None` asks the driver to infer the type from the
/// textual value; `Some` forces an explicitly typed binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Parameter name, kept for diagnostics; drivers that bind positionally
    /// use declaration order.
    pub name: String,
    /// Textual value; the driver performs any coercion.
    pub value: String,
    /// Resolved native type, or `None` for driver inference.
    pub native_type: Option<NativeType>,
}

/// SQL text plus its bound parameter set.
///
/// The parameter binder mutates `parameters`; the dispatcher hands the
/// finished command to the driver.
#[derive(Debug, Clone, Default)]
pub struct Command {
    /// The SQL statement text.
    pub sql: String,
    /// Parameters in declaration order.
    pub parameters: Vec<BoundParameter>,
}

impl Command {
    /// Create a command with an empty parameter set.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Attach one parameter to the command.
    pub fn add_parameter(&mut self, parameter: BoundParameter) {
        self.parameters.push(parameter);
    }
}
