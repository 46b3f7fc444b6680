use thiserror::Error;

/// Error returned by a fallible constructor
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors triggered while registering bindings or wiring an object graph
#[derive(Error, Debug)]
pub enum WiringError {
    #[error("Named entity {name} is double defined. Found at types {registered} and {rejected}")]
    DuplicateBinding {
        name: String,
        registered: String,
        rejected: String,
    },
    #[error("Unresolved dependency {owner}.{point}: no binding for {required}{}", qualifier_suffix(.qualifier))]
    UnresolvedDependency {
        owner: String,
        point: String,
        required: String,
        qualifier: Option<String>,
    },
    #[error("Failed to instantiate {type_name} for {owner}.{point} (requires {required}): {reason}")]
    Instantiation {
        owner: String,
        point: String,
        required: String,
        type_name: String,
        reason: String,
    },
    #[error("Cyclic dependencies: {path}")]
    CyclicDependency { path: String },
    #[error("Binding {bound} cannot be assigned to {owner}.{point} (requires {required})")]
    IncompatibleBinding {
        owner: String,
        point: String,
        required: String,
        bound: String,
    },
    #[error("Consistency error: the container is already initialized")]
    AlreadyInitialized,
}

fn qualifier_suffix(qualifier: &Option<String>) -> String {
    match qualifier {
        Some(name) => format!(" named >{name}<"),
        None => String::new(),
    }
}
