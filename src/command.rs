// src/command.rs

//! Single pipeline steps and their argument grammar.
//!
//! A [`Command`] is a [`Verb`] followed by zero or more scalar [`Param`]s.
//! It renders to one process argument: the verb token and the parameters
//! joined by commas, e.g. `RESIZE,512,384`.

use std::fmt;
use std::str::FromStr;

use crate::errors::VipserError;

/// A scalar step parameter.
///
/// Only these variants can be rendered, so an unsupported parameter type is
/// a compile error rather than a runtime failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Float `Display` is the shortest round-trip form and never uses
        // exponent notation.
        match self {
            Param::Text(s) => f.write_str(s),
            Param::Int(v) => write!(f, "{v}"),
            Param::Uint(v) => write!(f, "{v}"),
            Param::F32(v) => write!(f, "{v}"),
            Param::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::F32(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::F64(value)
    }
}

macro_rules! signed_param {
    ($($t:ty),*) => {
        $(impl From<$t> for Param {
            fn from(value: $t) -> Self {
                Param::Int(value as i64)
            }
        })*
    };
}

macro_rules! unsigned_param {
    ($($t:ty),*) => {
        $(impl From<$t> for Param {
            fn from(value: $t) -> Self {
                Param::Uint(value as u64)
            }
        })*
    };
}

signed_param!(i8, i16, i32, i64, isize);
unsigned_param!(u8, u16, u32, u64, usize);

/// Which background colour an embed step pads with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColor {
    White,
    Black,
}

impl EmbedColor {
    pub fn verb(self) -> Verb {
        match self {
            EmbedColor::White => Verb::EmbedWhite,
            EmbedColor::Black => Verb::EmbedBlack,
        }
    }
}

/// What kind of value a verb expects in each parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Int,
    Float,
    Text,
}

/// Every operation the external tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Resize,
    Stretch,
    Expand,
    Extract,
    EmbedWhite,
    EmbedBlack,
    Blur,
    Rotate,
    Autorot,
    Quality,
    Export,
}

impl Verb {
    pub const ALL: [Verb; 11] = [
        Verb::Resize,
        Verb::Stretch,
        Verb::Expand,
        Verb::Extract,
        Verb::EmbedWhite,
        Verb::EmbedBlack,
        Verb::Blur,
        Verb::Rotate,
        Verb::Autorot,
        Verb::Quality,
        Verb::Export,
    ];

    /// Token as it appears on the command line.
    pub fn token(self) -> &'static str {
        match self {
            Verb::Resize => "RESIZE",
            Verb::Stretch => "STRETCH",
            Verb::Expand => "EXPAND",
            Verb::Extract => "EXTRACT",
            Verb::EmbedWhite => "EMBWHT",
            Verb::EmbedBlack => "EMBBLK",
            Verb::Blur => "BLUR",
            Verb::Rotate => "ROTATE",
            Verb::Autorot => "AUTOROT",
            Verb::Quality => "QUALITY",
            Verb::Export => "EXPORT",
        }
    }

    /// Number of parameters following the token.
    pub fn arity(self) -> usize {
        self.param_kinds().len()
    }

    fn param_kinds(self) -> &'static [ParamKind] {
        use ParamKind::*;
        match self {
            Verb::Resize | Verb::Stretch | Verb::Expand => &[Int, Int],
            Verb::Extract | Verb::EmbedWhite | Verb::EmbedBlack => &[Int, Int, Int, Int],
            Verb::Blur => &[Float],
            Verb::Rotate | Verb::Quality => &[Int],
            Verb::Autorot => &[],
            Verb::Export => &[Text],
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Verb {
    type Err = VipserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        Verb::ALL
            .into_iter()
            .find(|v| v.token() == token)
            .ok_or_else(|| VipserError::InvalidStep(format!("unknown verb {s:?}")))
    }
}

/// One step of an operation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    verb: Verb,
    params: Vec<Param>,
}

impl Command {
    pub fn new(verb: Verb, params: Vec<Param>) -> Self {
        Self { verb, params }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Render as a single process argument, e.g. `EXTRACT,10,10,100,80`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb.token())?;
        for param in &self.params {
            write!(f, ",{param}")?;
        }
        Ok(())
    }
}

/// Parse a rendered step back into a typed command.
///
/// The verb decides how many parameters are required and whether each is an
/// integer, a float or free text. Used for steps given on the command line.
impl FromStr for Command {
    type Err = VipserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let verb: Verb = parts.next().unwrap_or_default().parse()?;
        let raw: Vec<&str> = parts.collect();

        let kinds = verb.param_kinds();
        if raw.len() != kinds.len() {
            return Err(VipserError::InvalidStep(format!(
                "{verb} takes {} parameter(s), got {} in {s:?}",
                kinds.len(),
                raw.len()
            )));
        }

        let params = raw
            .iter()
            .zip(kinds)
            .map(|(value, kind)| parse_param(verb, value.trim(), *kind))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Command::new(verb, params))
    }
}

fn parse_param(verb: Verb, value: &str, kind: ParamKind) -> Result<Param, VipserError> {
    let invalid = |what: &str| {
        VipserError::InvalidStep(format!("{verb} expects {what}, got {value:?}"))
    };

    match kind {
        ParamKind::Int => value.parse::<i64>().map(Param::Int).map_err(|_| invalid("an integer")),
        ParamKind::Float => value.parse::<f64>().map(Param::F64).map_err(|_| invalid("a number")),
        ParamKind::Text if value.is_empty() => Err(invalid("a non-empty value")),
        ParamKind::Text => Ok(Param::Text(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_scalar_kind() {
        let cmd = Command::new(
            Verb::Resize,
            vec![
                Param::from(-1i32),
                Param::from(-32i32),
                Param::from(-64i64),
                Param::from(1usize),
                Param::from(32u32),
                Param::from(64u64),
                Param::from(0.1f32),
                Param::from(0.1f64),
            ],
        );

        assert_eq!(cmd.render(), "RESIZE,-1,-32,-64,1,32,64,0.1,0.1");
    }

    #[test]
    fn floats_render_without_exponent_or_trailing_zero() {
        assert_eq!(Param::from(0.1f64).to_string(), "0.1");
        assert_eq!(Param::from(3.0f64).to_string(), "3");
        assert_eq!(Param::from(0.5f32).to_string(), "0.5");
        assert_eq!(Param::from(0.0001f64).to_string(), "0.0001");
    }

    #[test]
    fn comma_count_matches_arity() {
        for verb in Verb::ALL {
            let params = (0..verb.arity()).map(|i| Param::from(i as i32)).collect();
            let rendered = Command::new(verb, params).render();

            assert!(rendered.starts_with(verb.token()));
            assert!(!rendered.contains(' '));
            assert_eq!(rendered.matches(',').count(), verb.arity(), "{rendered}");
        }
    }

    #[test]
    fn autorot_has_no_separator() {
        assert_eq!(Command::new(Verb::Autorot, vec![]).render(), "AUTOROT");
    }

    #[test]
    fn embed_color_selects_verb() {
        assert_eq!(EmbedColor::White.verb().token(), "EMBWHT");
        assert_eq!(EmbedColor::Black.verb().token(), "EMBBLK");
    }

    #[test]
    fn parses_rendered_steps() {
        let cmd: Command = "RESIZE,512,384".parse().unwrap();
        assert_eq!(cmd.verb(), Verb::Resize);
        assert_eq!(cmd.params(), &[Param::Int(512), Param::Int(384)]);

        let blur: Command = "blur,0.5".parse().unwrap();
        assert_eq!(blur.render(), "BLUR,0.5");

        let export: Command = "EXPORT,png".parse().unwrap();
        assert_eq!(export.render(), "EXPORT,png");

        let autorot: Command = "AUTOROT".parse().unwrap();
        assert_eq!(autorot.params().len(), 0);
    }

    #[test]
    fn rejects_unknown_verbs_and_bad_arity() {
        assert!(matches!(
            "SHARPEN,1".parse::<Command>(),
            Err(VipserError::InvalidStep(msg)) if msg.contains("unknown verb")
        ));
        assert!(matches!(
            "RESIZE,1".parse::<Command>(),
            Err(VipserError::InvalidStep(msg)) if msg.contains("takes 2")
        ));
        assert!(matches!(
            "ROTATE,ninety".parse::<Command>(),
            Err(VipserError::InvalidStep(msg)) if msg.contains("integer")
        ));
        assert!("EXPORT,".parse::<Command>().is_err());
    }
}
