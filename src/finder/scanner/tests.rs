use super::{scan_imports, ImportKind, ImportStatement};

fn modules(source: &str) -> Vec<String> {
    scan_imports(source)
        .unwrap()
        .into_iter()
        .map(|statement| match statement.kind {
            ImportKind::Import { module } => module,
            ImportKind::From {
                level,
                module,
                names,
            } => format!(
                "{}{} -> {}",
                ".".repeat(level),
                module.unwrap_or_default(),
                names.join(",")
            ),
        })
        .collect()
}

// Tests for plain import statements
mod imports {
    use super::*;

    #[test]
    fn single_and_dotted() {
        assert_eq!(modules("import os\nimport os.path\n"), ["os", "os.path"]);
    }

    #[test]
    fn comma_separated_with_aliases() {
        assert_eq!(
            modules("import json as j, xml.dom.minidom as md, re"),
            ["json", "xml.dom.minidom", "re"]
        );
    }

    #[test]
    fn reports_line_numbers() {
        let statements = scan_imports("x = 1\n\nimport a\n").unwrap();
        assert_eq!(
            statements,
            [ImportStatement {
                line: 3,
                kind: ImportKind::Import {
                    module: "a".to_string()
                },
            }]
        );
    }

    #[test]
    fn nested_in_blocks_and_functions() {
        let source = "\
try:
    import cPickle as pickle
except ImportError:
    import pickle

def lazy():
    import gettext
    return gettext
";
        assert_eq!(modules(source), ["cPickle", "pickle", "gettext"]);
    }

    #[test]
    fn one_line_compound_statements() {
        assert_eq!(
            modules("if True: import a\nelse: import b; import c\n"),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn line_continuation() {
        assert_eq!(modules("import a, \\\n    b\n"), ["a", "b"]);
    }
}

// Tests for from-import statements
mod from_imports {
    use super::*;

    #[test]
    fn absolute() {
        assert_eq!(
            modules("from os import path, sep as s"),
            ["os -> path,sep"]
        );
    }

    #[test]
    fn relative_levels() {
        assert_eq!(
            modules("from . import a\nfrom .b import c\nfrom ... import d\n"),
            [". -> a", ".b -> c", "... -> d"]
        );
    }

    #[test]
    fn relative_without_spaces() {
        assert_eq!(modules("from .import a"), [". -> a"]);
    }

    #[test]
    fn star() {
        assert_eq!(modules("from gi.repository import *"), ["gi.repository -> *"]);
    }

    #[test]
    fn parenthesized_across_lines() {
        let source = "from pyanaconda.errors import (\n    ERROR_RAISE,\n    errorHandler,\n)\n";
        assert_eq!(
            modules(source),
            ["pyanaconda.errors -> ERROR_RAISE,errorHandler"]
        );
    }

    #[test]
    fn not_confused_by_yield_or_raise_from() {
        let source = "\
def gen():
    yield from other()
    raise ValueError() from None
";
        assert!(modules(source).is_empty());
    }
}

// Tests for source that only looks like imports
mod ignored {
    use super::*;

    #[test]
    fn comments() {
        assert!(modules("# import os\nx = 1  # from a import b\n").is_empty());
    }

    #[test]
    fn strings() {
        let source = "\
s = 'import a'
t = \"from b import c\"
u = rb'import d'
";
        assert!(modules(source).is_empty());
    }

    #[test]
    fn docstrings() {
        let source = "\"\"\"\nimport os\n\"\"\"\nimport sys\n";
        assert_eq!(modules(source), ["sys"]);
    }

    #[test]
    fn escaped_quotes() {
        let source = "s = 'it\\'s'\nimport a\n";
        assert_eq!(modules(source), ["a"]);
    }

    #[test]
    fn attribute_and_keyword_lookalikes() {
        let source = "importlib = None\nfrom_here = 1\nx = {'a': 1}\n";
        assert!(modules(source).is_empty());
    }

    #[test]
    fn dict_colons_do_not_start_statements() {
        assert!(modules("d = {1: import_me}\n").is_empty());
    }
}

// Tests for sources that must be rejected
mod errors {
    use super::*;

    #[test]
    fn unterminated_string() {
        let err = scan_imports("x = 1\ns = 'oops\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn unterminated_triple_quoted_string() {
        let err = scan_imports("import a\n'''\nnever closed\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("triple-quoted"));
    }

    #[test]
    fn unclosed_bracket() {
        let err = scan_imports("x = foo(\n1, 2\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn mismatched_bracket() {
        assert!(scan_imports("x = [1, 2)\n").is_err());
        assert!(scan_imports("x = 1)\n").is_err());
    }

    #[test]
    fn malformed_imports() {
        assert!(scan_imports("import\n").is_err());
        assert!(scan_imports("from os\n").is_err());
        assert!(scan_imports("from import x\n").is_err());
        assert!(scan_imports("from os import\n").is_err());
        assert!(scan_imports("import a b\n").is_err());
        assert!(scan_imports("from os import path,\n").is_err());
    }
}
