//! OSC argument conversion

use crate::{error::ControlError, Result};
use rosc::OscType;

/// Read an executor value from the first OSC argument.
///
/// Float, double and integer arguments are accepted. Non-finite values are
/// rejected.
pub fn osc_to_value(osc_args: &[OscType]) -> Result<f32> {
    let first = osc_args
        .first()
        .ok_or_else(|| ControlError::InvalidMessage("No OSC arguments".to_string()))?;

    let value = match first {
        OscType::Float(f) => *f,
        OscType::Double(d) => *d as f32,
        OscType::Int(i) => *i as f32,
        OscType::Long(l) => *l as f32,
        other => {
            return Err(ControlError::InvalidMessage(format!(
                "Unsupported OSC type: {:?}",
                other
            )))
        }
    };

    if !value.is_finite() {
        return Err(ControlError::InvalidMessage(format!(
            "Non-finite OSC value: {}",
            value
        )));
    }

    Ok(value)
}

/// Clamp a command value into `[0, 1]` and wrap it as an OSC float
pub fn value_to_osc(value: f32) -> OscType {
    OscType::Float(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc_to_value() {
        assert_eq!(osc_to_value(&[OscType::Float(0.5)]).unwrap(), 0.5);
        assert_eq!(osc_to_value(&[OscType::Double(0.25)]).unwrap(), 0.25);
        assert_eq!(osc_to_value(&[OscType::Int(1)]).unwrap(), 1.0);
        assert_eq!(
            osc_to_value(&[OscType::Float(0.75), OscType::Int(3)]).unwrap(),
            0.75
        );
    }

    #[test]
    fn test_osc_validation() {
        assert!(osc_to_value(&[]).is_err());
        assert!(osc_to_value(&[OscType::Float(f32::NAN)]).is_err());
        assert!(osc_to_value(&[OscType::Double(f64::INFINITY)]).is_err());
        assert!(osc_to_value(&[OscType::String("on".to_string())]).is_err());
    }

    #[test]
    fn test_value_to_osc_clamps() {
        assert_eq!(value_to_osc(1.5), OscType::Float(1.0));
        assert_eq!(value_to_osc(-0.2), OscType::Float(0.0));
        assert_eq!(value_to_osc(0.4), OscType::Float(0.4));
    }
}
