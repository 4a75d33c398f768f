//! The parameter binder.
//!
//! Maps caller-declared [`QueryParameter`]s onto the command's parameter
//! set: `Auto` keeps driver inference, everything else resolves through the
//! static [`NativeType`] table before any driver call is made.

use crate::driver::{BoundParameter, Command, NativeType};
use crate::error::Db2MiddlewareError;
use crate::types::{DataType, QueryParameter};

/// Attach the declared parameters to the command.
///
/// # Errors
/// Returns `Db2MiddlewareError::TypeResolution` if a declared type does not
/// resolve to a native type. The command is left partially bound in that
/// case; callers discard it.
pub fn bind_parameters(
    command: &mut Command,
    parameters: &[QueryParameter],
) -> Result<(), Db2MiddlewareError> {
    for parameter in parameters {
        let native_type = match parameter.data_type {
            DataType::Auto => None,
            declared => Some(NativeType::resolve(declared)?),
        };
        command.add_parameter(BoundParameter {
            name: parameter.name.clone(),
            value: parameter.value.clone(),
            native_type,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_parameters_bind_by_inference() {
        let mut command = Command::new("SELECT * FROM t WHERE id = ?");
        bind_parameters(&mut command, &[QueryParameter::auto("id", "1")]).unwrap();

        assert_eq!(command.parameters.len(), 1);
        assert_eq!(command.parameters[0].name, "id");
        assert_eq!(command.parameters[0].value, "1");
        assert!(command.parameters[0].native_type.is_none());
    }

    #[test]
    fn declared_types_bind_with_their_native_counterpart() {
        let mut command = Command::new("INSERT INTO t VALUES (?, ?)");
        bind_parameters(
            &mut command,
            &[
                QueryParameter::new("id", "7", DataType::Integer),
                QueryParameter::new("name", "Doe", DataType::NVarChar),
            ],
        )
        .unwrap();

        assert_eq!(
            command.parameters[0].native_type,
            Some(NativeType::Integer)
        );
        assert_eq!(
            command.parameters[1].native_type,
            Some(NativeType::NVarChar)
        );
    }

    #[test]
    fn binding_preserves_declaration_order() {
        let mut command = Command::new("INSERT INTO t VALUES (?, ?, ?)");
        let declared = [
            QueryParameter::auto("a", "1"),
            QueryParameter::new("b", "2", DataType::BigInt),
            QueryParameter::auto("c", "3"),
        ];
        bind_parameters(&mut command, &declared).unwrap();

        let names: Vec<_> = command.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
