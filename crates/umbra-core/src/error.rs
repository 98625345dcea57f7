//! Error taxonomy for the shadow runtime

/// Errors produced by registration, construction, and dispatch
#[derive(Debug, thiserror::Error)]
pub enum UmbraError {
    /// Two shadow classes claim the same real class; fatal at build time
    #[error("duplicate shadow registration for `{real}`: `{existing}` already registered, `{shadow}` rejected")]
    DuplicateRegistration {
        /// Real class both registrations claim
        real: String,
        /// Shadow class that won (registered first)
        existing: String,
        /// Shadow class that was rejected
        shadow: String,
    },

    /// A shadow could not be instantiated or its constructor hook failed
    #[error("failed to instantiate shadow `{shadow}` for `{class}`: {reason}")]
    ShadowInstantiation {
        /// Real class being constructed
        class: String,
        /// Shadow class that failed
        shadow: String,
        /// What went wrong
        reason: String,
    },

    /// `shadow_of` called on an object constructed in pass-through mode
    #[error("no shadow bound for instance of `{class}`")]
    NoShadowBound {
        /// Class of the unshadowed object
        class: String,
    },

    /// Pass-through construction with arguments no real constructor accepts
    #[error("no constructor on `{class}` matching `{sig}`")]
    NoMatchingConstructor {
        /// Class being constructed
        class: String,
        /// Signature formed from the argument tags
        sig: String,
    },

    /// Class name never registered
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    /// Shadow class name never registered
    #[error("unknown shadow class `{0}`")]
    UnknownShadowClass(String),

    /// Dispatch found neither a shadow override nor a real method body
    #[error("no method `{sig}` on class `{class}`")]
    UnknownMethod {
        /// Class of the receiver
        class: String,
        /// Signature formed from the call
        sig: String,
    },

    /// Application-level failure raised by a method body; passes through
    /// dispatch unmodified
    #[error("{0}")]
    Method(String),

    /// A state accessor asked for a type no state slot holds
    #[error("no state slot of type `{expected}`")]
    StateType {
        /// Requested state type
        expected: &'static str,
    },

    /// Malformed runtime options input
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the runtime
pub type UmbraResult<T> = Result<T, UmbraError>;
