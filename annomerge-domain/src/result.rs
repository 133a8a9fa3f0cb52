use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};

/// A message-carrying error for geometry-kernel failures (degenerate shapes,
/// empty point sets, malformed run-length data).
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct GeomError {
    msg: String,
}
impl GeomError {
    #[must_use]
    pub fn new(msg: &str) -> GeomError {
        GeomError {
            msg: msg.to_string(),
        }
    }
    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }
}
impl Display for GeomError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}
impl Error for GeomError {}
impl From<&str> for GeomError {
    fn from(value: &str) -> Self {
        GeomError::new(value)
    }
}

pub type GeomResult<U> = Result<U, GeomError>;

/// Creates a [`GeomError`] with a formatted message.
/// ```rust
/// # use std::error::Error;
/// use annomerge_domain::{geomerr, result::GeomError};
/// # fn main() -> Result<(), Box<dyn Error>> {
/// assert_eq!(geomerr!("some error {}", 1), GeomError::new(format!("some error {}", 1).as_str()));
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! geomerr {
    ($s:literal) => {
        $crate::result::GeomError::new(format!($s).as_str())
    };
    ($s:literal, $( $exps:expr ),*) => {
        $crate::result::GeomError::new(format!($s, $($exps,)*).as_str())
    }
}

pub fn to_geom<E: Debug>(e: E) -> GeomError {
    geomerr!(
        "original error type is '{:?}', error message is '{:?}'",
        std::any::type_name::<E>(),
        e
    )
}
