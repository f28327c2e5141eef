//! Standard-library function documentation used for hover
//!
//! The registry is a lookup seam: the language handler only needs
//! [`FunctionRegistry::lookup`], so a richer source of documentation can be
//! swapped in without touching request handling.

/// A parameter or return value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgInfo {
    pub name: &'static str,
    pub type_name: &'static str,
    pub description: &'static str,
}

/// Documentation for one function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Package namespace, empty for global functions
    pub namespace: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ArgInfo],
    pub return_values: &'static [ArgInfo],
}

impl FunctionInfo {
    /// Signature line, e.g. `func max(...nums number) number`
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|param| format!("{} {}", param.name, param.type_name))
            .collect::<Vec<_>>()
            .join(", ");

        let signature = format!("func {}({})", self.name, params);

        match self.return_values {
            [] => signature,
            [single] => format!("{} {}", signature, single.type_name),
            many => {
                let types = many
                    .iter()
                    .map(|ret| ret.type_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{signature} ({types})")
            }
        }
    }

    /// Markdown documentation block
    pub fn documentation(&self) -> String {
        let mut doc = format!(
            "```dlitescript\n{}\n```\n\n{}\n\n",
            self.signature(),
            self.description
        );

        if !self.parameters.is_empty() {
            doc.push_str("**Parameters:**\n");
            for param in self.parameters {
                doc.push_str(&format!(
                    "```dlitescript\n{} {}\n```\n",
                    param.name, param.type_name
                ));
                push_description(&mut doc, param.description);
            }
        }

        if !self.return_values.is_empty() {
            doc.push_str("\n**Return Values:**\n");
            for ret in self.return_values {
                doc.push_str(&format!("```dlitescript\n{}\n```\n", ret.type_name));
                push_description(&mut doc, ret.description);
            }
        }

        doc
    }
}

fn push_description(doc: &mut String, description: &str) {
    if !description.is_empty() {
        doc.push_str(description);
        doc.push('\n');
    }
}

/// Looks up function documentation by callee
pub trait FunctionRegistry: Send {
    fn lookup(&self, namespace: &str, name: &str) -> Option<&FunctionInfo>;
}

// ============================================================================
// Built-in Functions
// ============================================================================

const NUMBER_RESULT: &[ArgInfo] = &[ArgInfo {
    name: "result",
    type_name: "number",
    description: "The computed number.",
}];

const SINGLE_NUMBER: &[ArgInfo] = &[ArgInfo {
    name: "num",
    type_name: "number",
    description: "The input number.",
}];

const NUMBER_LIST: &[ArgInfo] = &[ArgInfo {
    name: "...nums",
    type_name: "number",
    description: "The numbers to process. At least two numbers are required.",
}];

const BUILTINS: &[FunctionInfo] = &[
    FunctionInfo {
        namespace: "",
        name: "printf",
        description: "Prints a formatted string.",
        parameters: &[
            ArgInfo {
                name: "format",
                type_name: "string",
                description: "The format string.",
            },
            ArgInfo {
                name: "...args",
                type_name: "any",
                description: "The arguments to format.",
            },
        ],
        return_values: &[],
    },
    FunctionInfo {
        namespace: "",
        name: "sprintf",
        description: "Returns a formatted string.",
        parameters: &[
            ArgInfo {
                name: "format",
                type_name: "string",
                description: "The format string.",
            },
            ArgInfo {
                name: "...args",
                type_name: "any",
                description: "The arguments to format.",
            },
        ],
        return_values: &[ArgInfo {
            name: "result",
            type_name: "string",
            description: "The formatted string.",
        }],
    },
    FunctionInfo {
        namespace: "",
        name: "dump",
        description: "Outputs a formatted representation of the provided value.",
        parameters: &[ArgInfo {
            name: "...values",
            type_name: "any",
            description: "The values to dump.",
        }],
        return_values: &[],
    },
    FunctionInfo {
        namespace: "",
        name: "exit",
        description: "Exits the running script with a given exit code.",
        parameters: &[ArgInfo {
            name: "code",
            type_name: "number",
            description: "The exit code to return.",
        }],
        return_values: &[],
    },
    FunctionInfo {
        namespace: "math",
        name: "abs",
        description: "Returns the absolute value of a number.",
        parameters: SINGLE_NUMBER,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "ceil",
        description: "Rounds a number up to the nearest integer.",
        parameters: SINGLE_NUMBER,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "floor",
        description: "Rounds a number down to the nearest integer.",
        parameters: SINGLE_NUMBER,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "round",
        description: "Rounds a number to the nearest integer.",
        parameters: SINGLE_NUMBER,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "sqrt",
        description: "Returns the square root of a number.",
        parameters: SINGLE_NUMBER,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "max",
        description: "Returns the largest of the provided numbers.",
        parameters: NUMBER_LIST,
        return_values: NUMBER_RESULT,
    },
    FunctionInfo {
        namespace: "math",
        name: "min",
        description: "Returns the smallest of the provided numbers.",
        parameters: NUMBER_LIST,
        return_values: NUMBER_RESULT,
    },
];

/// Registry backed by the built-in function table
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRegistry;

impl FunctionRegistry for BuiltinRegistry {
    fn lookup(&self, namespace: &str, name: &str) -> Option<&FunctionInfo> {
        BUILTINS
            .iter()
            .find(|info| info.namespace == namespace && info.name == name)
    }
}
