//! Error types.
use quick_error::quick_error;

quick_error! {
    /// Errors reported by fallible operations of the UI core.
    ///
    /// Most configuration problems are not surfaced as errors. They are
    /// logged and the offending operation is skipped, so that a single
    /// malformed widget cannot take the whole interface down.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub enum Error {
        UnknownStrata(name: String) {
            description("unknown frame strata")
            display("unknown frame strata: {:?}", name)
        }
        UnknownLayer(name: String) {
            description("unknown layer")
            display("unknown layer: {:?}", name)
        }
        UnknownAnchorPoint(name: String) {
            description("unknown anchor point")
            display("unknown anchor point: {:?}", name)
        }
        InvalidName(name: String) {
            description("invalid object name")
            display("{:?} is not a valid object name", name)
        }
        DuplicateName(name: String) {
            description("an object with the same name already exists")
            display("an object named {:?} already exists", name)
        }
        NoSuchPoint(object: String) {
            description("the anchor slot is empty")
            display("{}: no anchor is set at the given point", object)
        }
        Script(message: String) {
            description("script error")
            display("{}", message)
        }
    }
}

/// The error type returned by script handlers.
pub type ScriptError = Box<dyn std::error::Error>;

/// The return type of script handlers.
pub type ScriptResult = Result<(), ScriptError>;
