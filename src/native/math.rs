use super::number_argument;
use crate::interpreter::SystemContext;
use crate::value::{error::RuntimeErrorKind, NativeFunction, Value};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    Absolute,
    Sine,
    Cosine,
    Tangent,
    Power,
    SquareRoot,
    Ceiling,
    Floor,
    Random,
}

impl MathFunction {
    pub const ALL: [MathFunction; 9] = [
        MathFunction::Absolute,
        MathFunction::Sine,
        MathFunction::Cosine,
        MathFunction::Tangent,
        MathFunction::Power,
        MathFunction::SquareRoot,
        MathFunction::Ceiling,
        MathFunction::Floor,
        MathFunction::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MathFunction::Absolute => "absoluto",
            MathFunction::Sine => "seno",
            MathFunction::Cosine => "cosseno",
            MathFunction::Tangent => "tangente",
            MathFunction::Power => "potencia",
            MathFunction::SquareRoot => "raiz",
            MathFunction::Ceiling => "teto",
            MathFunction::Floor => "chao",
            MathFunction::Random => "aleatorio",
        }
    }

    /// `aleatorio()` is in `[0, 1)`, `aleatorio(max)` in `[0, max)` and
    /// `aleatorio(min, max)` in `[min, max)`.
    fn random(arguments: &[Value]) -> Result<f64, RuntimeErrorKind> {
        let mut rng = rand::thread_rng();
        let (min, max) = match arguments.len() {
            0 => return Ok(rng.gen::<f64>()),
            1 => (0.0, number_argument(arguments, 0, "max")?),
            _ => (
                number_argument(arguments, 0, "min")?,
                number_argument(arguments, 1, "max")?,
            ),
        };
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(RuntimeErrorKind::InvalidArgument {
                name: "max",
                expected: "a finite Number above the minimum",
            });
        }
        Ok(rng.gen_range(min..max))
    }
}

impl NativeFunction for MathFunction {
    fn get_name(&self) -> &str {
        self.name()
    }

    fn call(
        &self,
        arguments: &[Value],
        _context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeErrorKind> {
        let result = match self {
            MathFunction::Absolute => number_argument(arguments, 0, "valor")?.abs(),
            MathFunction::Sine => number_argument(arguments, 0, "valor")?.sin(),
            MathFunction::Cosine => number_argument(arguments, 0, "valor")?.cos(),
            MathFunction::Tangent => number_argument(arguments, 0, "valor")?.tan(),
            MathFunction::Power => {
                let base = number_argument(arguments, 0, "base")?;
                let exponent = number_argument(arguments, 1, "expoente")?;
                base.powf(exponent)
            }
            MathFunction::SquareRoot => number_argument(arguments, 0, "valor")?.sqrt(),
            MathFunction::Ceiling => number_argument(arguments, 0, "valor")?.ceil(),
            MathFunction::Floor => number_argument(arguments, 0, "valor")?.floor(),
            MathFunction::Random => Self::random(arguments)?,
        };
        Ok(Value::Number(result))
    }
}
