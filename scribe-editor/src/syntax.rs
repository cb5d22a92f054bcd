//! Token rules for the editor page's highlighter.
//!
//! The page tokenizes on every keystroke, so the grammar travels with
//! `SetContent` / `SetLanguage` and highlighting itself runs in the page.

use serde::{Deserialize, Serialize};

use scribe_core::Language;

/// Lexical rules for one language: keywords, comments and string quotes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyntaxRules {
    pub keywords: Vec<String>,
    pub case_sensitive: bool,
    pub line_comment: Option<String>,
    pub block_comment: Option<(String, String)>,
    pub quotes: Vec<char>,
    /// Whether bare numbers get their own colour.
    pub numbers: bool,
}

struct Grammar {
    keywords: &'static [&'static str],
    case_sensitive: bool,
    line_comment: Option<&'static str>,
    block_comment: Option<(&'static str, &'static str)>,
    quotes: &'static str,
    numbers: bool,
}

const PLAIN: Grammar = Grammar {
    keywords: &[],
    case_sensitive: true,
    line_comment: None,
    block_comment: None,
    quotes: "",
    numbers: false,
};

const C_COMMENTS: (&str, &str) = ("/*", "*/");
const MARKUP_COMMENTS: (&str, &str) = ("<!--", "-->");

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "false", "finally", "for", "from", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
    "yield",
];

const TS_KEYWORDS: &[&str] = &[
    "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "continue", "declare", "default", "do", "else", "enum", "export", "extends",
    "false", "finally", "for", "from", "function", "if", "implements", "import", "in",
    "interface", "keyof", "let", "namespace", "never", "new", "null", "number", "private",
    "protected", "public", "readonly", "return", "static", "string", "super", "switch", "this",
    "throw", "true", "try", "type", "typeof", "undefined", "unknown", "var", "void", "while",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "continue",
    "default", "do", "double", "else", "enum", "extends", "false", "final", "finally", "float",
    "for", "if", "implements", "import", "instanceof", "int", "interface", "long", "new", "null",
    "package", "private", "protected", "public", "return", "short", "static", "super", "switch",
    "synchronized", "this", "throw", "throws", "true", "try", "void", "volatile", "while",
];

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
    "unsigned", "void", "volatile", "while", "NULL",
];

const CPP_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "constexpr", "continue",
    "default", "delete", "do", "double", "else", "enum", "explicit", "extern", "false", "float",
    "for", "friend", "if", "inline", "int", "long", "namespace", "new", "noexcept", "nullptr",
    "operator", "private", "protected", "public", "return", "short", "sizeof", "static",
    "struct", "switch", "template", "this", "throw", "true", "try", "typedef", "typename",
    "union", "unsigned", "using", "virtual", "void", "while",
];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "base", "bool", "break", "case", "catch", "class",
    "const", "continue", "default", "delegate", "do", "double", "else", "enum", "false",
    "finally", "for", "foreach", "if", "in", "int", "interface", "internal", "is", "namespace",
    "new", "null", "out", "override", "private", "protected", "public", "readonly", "ref",
    "return", "sealed", "static", "string", "struct", "switch", "this", "throw", "true", "try",
    "using", "var", "virtual", "void", "while",
];

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "false", "for", "func", "go", "goto", "if", "import", "interface", "map", "nil", "package",
    "range", "return", "select", "struct", "switch", "true", "type", "var",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const PHP_KEYWORDS: &[&str] = &[
    "abstract", "array", "as", "break", "case", "catch", "class", "const", "continue", "default",
    "do", "echo", "else", "elseif", "extends", "false", "final", "finally", "for", "foreach",
    "function", "if", "implements", "include", "interface", "namespace", "new", "null",
    "private", "protected", "public", "require", "return", "static", "switch", "throw", "true",
    "try", "use", "while",
];

const RUBY_KEYWORDS: &[&str] = &[
    "BEGIN", "END", "alias", "and", "begin", "break", "case", "class", "def", "defined", "do",
    "else", "elsif", "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not",
    "or", "redo", "rescue", "retry", "return", "self", "super", "then", "true", "undef",
    "unless", "until", "when", "while", "yield",
];

const SHELL_KEYWORDS: &[&str] = &[
    "case", "do", "done", "elif", "else", "esac", "export", "fi", "for", "function", "if", "in",
    "local", "return", "select", "then", "until", "while",
];

const SQL_KEYWORDS: &[&str] = &[
    "add", "all", "alter", "and", "as", "asc", "between", "by", "case", "create", "delete",
    "desc", "distinct", "drop", "else", "end", "exists", "from", "group", "having", "in",
    "index", "inner", "insert", "into", "is", "join", "left", "like", "limit", "not", "null",
    "on", "or", "order", "outer", "primary", "key", "right", "select", "set", "table", "then",
    "union", "update", "values", "when", "where",
];

const CSS_KEYWORDS: &[&str] = &[
    "auto", "important", "import", "inherit", "initial", "keyframes", "media", "none",
];

const JSON_KEYWORDS: &[&str] = &["true", "false", "null"];

const YAML_KEYWORDS: &[&str] = &["true", "false", "null", "yes", "no", "on", "off"];

const MERMAID_KEYWORDS: &[&str] = &[
    "graph", "flowchart", "subgraph", "end", "sequenceDiagram", "classDiagram", "stateDiagram",
    "erDiagram", "gantt", "pie", "journey", "gitGraph", "mindmap", "timeline",
    "participant", "actor", "note", "loop", "alt", "else", "opt", "par", "and", "rect",
    "activate", "deactivate", "title", "section", "class", "click", "style", "classDef",
    "linkStyle", "TD", "TB", "BT", "RL", "LR",
];

fn grammar(language: Language) -> Grammar {
    let c_like = |keywords: &'static [&'static str]| Grammar {
        keywords,
        case_sensitive: true,
        line_comment: Some("//"),
        block_comment: Some(C_COMMENTS),
        quotes: "\"'",
        numbers: true,
    };
    match language {
        Language::Plaintext => PLAIN,
        Language::Javascript => Grammar {
            quotes: "\"'`",
            ..c_like(JS_KEYWORDS)
        },
        Language::Typescript => Grammar {
            quotes: "\"'`",
            ..c_like(TS_KEYWORDS)
        },
        Language::Java => c_like(JAVA_KEYWORDS),
        Language::C => c_like(C_KEYWORDS),
        Language::Cpp => c_like(CPP_KEYWORDS),
        Language::Csharp => c_like(CSHARP_KEYWORDS),
        Language::Go => Grammar {
            quotes: "\"'`",
            ..c_like(GO_KEYWORDS)
        },
        Language::Rust => Grammar {
            quotes: "\"",
            ..c_like(RUST_KEYWORDS)
        },
        Language::Php => Grammar {
            line_comment: Some("#"),
            ..c_like(PHP_KEYWORDS)
        },
        Language::Css => Grammar {
            keywords: CSS_KEYWORDS,
            case_sensitive: false,
            line_comment: None,
            block_comment: Some(C_COMMENTS),
            quotes: "\"'",
            numbers: true,
        },
        Language::Json => Grammar {
            keywords: JSON_KEYWORDS,
            case_sensitive: true,
            line_comment: None,
            block_comment: None,
            quotes: "\"",
            numbers: true,
        },
        Language::Python => Grammar {
            keywords: PYTHON_KEYWORDS,
            case_sensitive: true,
            line_comment: Some("#"),
            block_comment: None,
            quotes: "\"'",
            numbers: true,
        },
        Language::Ruby => Grammar {
            keywords: RUBY_KEYWORDS,
            case_sensitive: true,
            line_comment: Some("#"),
            block_comment: None,
            quotes: "\"'",
            numbers: true,
        },
        Language::Shell => Grammar {
            keywords: SHELL_KEYWORDS,
            case_sensitive: true,
            line_comment: Some("#"),
            block_comment: None,
            quotes: "\"'",
            numbers: false,
        },
        Language::Yaml => Grammar {
            keywords: YAML_KEYWORDS,
            case_sensitive: false,
            line_comment: Some("#"),
            block_comment: None,
            quotes: "\"'",
            numbers: true,
        },
        Language::Sql => Grammar {
            keywords: SQL_KEYWORDS,
            case_sensitive: false,
            line_comment: Some("--"),
            block_comment: Some(C_COMMENTS),
            quotes: "'\"",
            numbers: true,
        },
        Language::Html | Language::Xml => Grammar {
            block_comment: Some(MARKUP_COMMENTS),
            quotes: "\"",
            ..PLAIN
        },
        Language::Markdown => Grammar {
            block_comment: Some(MARKUP_COMMENTS),
            ..PLAIN
        },
        Language::Mermaid => Grammar {
            keywords: MERMAID_KEYWORDS,
            case_sensitive: true,
            line_comment: Some("%%"),
            block_comment: None,
            quotes: "\"",
            numbers: false,
        },
    }
}

/// Highlighting rules for `language`. Plaintext gets empty rules.
pub fn syntax_rules(language: Language) -> SyntaxRules {
    let g = grammar(language);
    SyntaxRules {
        keywords: g.keywords.iter().map(|k| k.to_string()).collect(),
        case_sensitive: g.case_sensitive,
        line_comment: g.line_comment.map(String::from),
        block_comment: g
            .block_comment
            .map(|(start, end)| (start.to_string(), end.to_string())),
        quotes: g.quotes.chars().collect(),
        numbers: g.numbers,
    }
}
