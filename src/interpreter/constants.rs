// Constants for the interpreter

/// Deepest allowed nesting of function and built-in invocations.
/// The next call past this depth raises a `RecursionError`.
pub const MAX_RECURSION_DEPTH: usize = 100;

/// Number of spaces that make one indentation level.
pub const INDENT_WIDTH: usize = 4;

/// Names a `praeter` clause may catch. `Exception` catches every dynamic error.
pub const EXCEPTION_NAMES: [&str; 8] = [
    "Exception",
    "RuntimeError",
    "TypeError",
    "NameError",
    "AttributeError",
    "IndexError",
    "RecursionError",
    "ZeroDivisionError",
];

/// Display name of a script's top-level context.
pub const PROGRAM_CONTEXT: &str = "<program>";

/// Host stack size for threads that run scripts. Deep recursion in a script
/// becomes deep recursion in the evaluator.
pub const EVALUATOR_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Longest string, in bytes, that repetition may build.
pub const MAX_STRING_LENGTH: usize = 1 << 28;
