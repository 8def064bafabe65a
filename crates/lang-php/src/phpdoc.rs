//! Doc-comment tag parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^/\*\*[ \t]*|\s*\*/$|^[ \t]*\*[ \t]?").unwrap());

static PARAM_OR_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(@param|@property|@property-read|@property-write)\s+(\S+)\s+(&?(?:\.\.\.)?\$\S+)\s*(.*)$")
        .unwrap()
});

static VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(@var)\s+(\S+)(?:\s+(\$\S+))?\s*(.*)$").unwrap()
});

static RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(@return)\s+(\S+)\s*(.*)$").unwrap()
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(@method)\s+(?:(static)\s+)?(?:(\S+)\s+)?(\S+)\(\s*(.*?)\s*\)\s*(.*)$")
        .unwrap()
});

static INHERIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{?@inheritdoc\}?").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TagKind {
    Param,
    Var,
    Property,
    PropertyRead,
    PropertyWrite,
    Return,
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTagParam {
    pub type_string: String,
    pub name: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub kind: TagKind,
    pub type_string: String,
    /// Variable name including `$`, or the method name for `@method`.
    pub name: String,
    pub description: String,
    pub is_static: bool,
    pub parameters: Vec<MethodTagParam>,
}

impl Tag {
    fn new(kind: TagKind, type_string: &str, name: &str, description: &str) -> Self {
        Self {
            kind,
            type_string: type_string.to_string(),
            name: name.to_string(),
            description: description.trim().to_string(),
            is_static: false,
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhpDoc {
    /// Summary and description text before the first tag.
    pub text: String,
    pub tags: Vec<Tag>,
    pub inherit_doc: bool,
}

impl PhpDoc {
    pub fn parse(input: &str) -> PhpDoc {
        let stripped = STRIP.replace_all(input, "");
        let stripped = stripped.trim();

        let mut doc = PhpDoc {
            inherit_doc: INHERIT.is_match(stripped),
            ..PhpDoc::default()
        };

        let mut chunks: Vec<String> = Vec::new();
        let mut text = Vec::new();
        for line in stripped.lines() {
            if line.trim_start().starts_with('@') {
                chunks.push(line.trim().to_string());
            } else if let Some(current) = chunks.last_mut() {
                current.push('\n');
                current.push_str(line);
            } else {
                text.push(line);
            }
        }
        doc.text = text.join("\n").trim().to_string();
        doc.tags = chunks.iter().filter_map(|c| parse_tag(c)).collect();
        doc
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tags.is_empty()
    }

    pub fn find_param(&self, name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| t.kind == TagKind::Param && t.name == name)
    }

    /// `@var` with a matching name, or the first unnamed one.
    pub fn find_var(&self, name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .filter(|t| t.kind == TagKind::Var)
            .find(|t| t.name.is_empty() || t.name == name)
    }

    pub fn var_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Var)
    }

    pub fn return_tag(&self) -> Option<&Tag> {
        self.tags.iter().find(|t| t.kind == TagKind::Return)
    }

    pub fn property_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| {
            matches!(
                t.kind,
                TagKind::Property | TagKind::PropertyRead | TagKind::PropertyWrite
            )
        })
    }

    pub fn method_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Method)
    }
}

fn parse_tag(chunk: &str) -> Option<Tag> {
    let keyword = chunk.split_whitespace().next()?;
    match keyword {
        "@param" | "@property" | "@property-read" | "@property-write" => {
            let caps = PARAM_OR_PROPERTY.captures(chunk)?;
            let kind = match &caps[1] {
                "@param" => TagKind::Param,
                "@property" => TagKind::Property,
                "@property-read" => TagKind::PropertyRead,
                _ => TagKind::PropertyWrite,
            };
            let name = caps[3].trim_start_matches('&').trim_start_matches("...");
            Some(Tag::new(kind, &caps[2], name, &caps[4]))
        }
        "@var" => {
            let caps = VAR.captures(chunk)?;
            let name = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            Some(Tag::new(TagKind::Var, &caps[2], name, &caps[4]))
        }
        "@return" => {
            let caps = RETURN.captures(chunk)?;
            Some(Tag::new(TagKind::Return, &caps[2], "", &caps[3]))
        }
        "@method" => {
            let caps = METHOD.captures(chunk)?;
            let mut tag = Tag::new(
                TagKind::Method,
                caps.get(3).map(|m| m.as_str()).unwrap_or(""),
                &caps[4],
                &caps[6],
            );
            tag.is_static = caps.get(2).is_some();
            tag.parameters = parse_method_params(&caps[5]);
            Some(tag)
        }
        _ => None,
    }
}

fn parse_method_params(text: &str) -> Vec<MethodTagParam> {
    text.split(',')
        .filter_map(|param| {
            let (decl, default) = match param.split_once('=') {
                Some((d, v)) => (d.trim(), Some(v.trim().to_string())),
                None => (param.trim(), None),
            };
            let parts: Vec<&str> = decl.split_whitespace().collect();
            let pos = parts.iter().position(|p| p.contains('$'))?;
            let name = parts[pos]
                .trim_start_matches('&')
                .trim_start_matches("...")
                .to_string();
            Some(MethodTagParam {
                type_string: parts[..pos].join(" "),
                name,
                default,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_doc_serializes_for_presentation() {
        let doc = PhpDoc::parse("/**\n * Saves it.\n * @return bool ok\n */");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["text"], "Saves it.");
        assert_eq!(json["tags"][0]["kind"], "Return");
        assert_eq!(json["tags"][0]["type_string"], "bool");
        assert_eq!(json["inherit_doc"], false);
    }

    #[test]
    fn parses_summary_and_tags() {
        let doc = PhpDoc::parse(
            "/**\n * Adds things.\n *\n * @param int $a first\n *   operand\n * @param Foo[] $b\n * @return int|null the sum\n */",
        );
        assert_eq!(doc.text, "Adds things.");
        let a = doc.find_param("$a").unwrap();
        assert_eq!(a.type_string, "int");
        assert_eq!(a.description, "first\n  operand");
        assert_eq!(doc.find_param("$b").unwrap().type_string, "Foo[]");
        assert_eq!(doc.return_tag().unwrap().type_string, "int|null");
    }

    #[test]
    fn var_with_and_without_name() {
        let named = PhpDoc::parse("/** @var Foo $x */");
        assert_eq!(named.find_var("$x").unwrap().type_string, "Foo");
        assert!(named.find_var("$y").is_none());

        let unnamed = PhpDoc::parse("/** @var Bar */");
        let tag = unnamed.find_var("$anything").unwrap();
        assert_eq!(tag.type_string, "Bar");
        assert!(tag.name.is_empty());
    }

    #[test]
    fn magic_members() {
        let doc = PhpDoc::parse(
            "/**\n * @property-read string $name\n * @method static Foo create(int $id, $opts = [])\n * @method void reset()\n */",
        );
        let props: Vec<_> = doc.property_tags().collect();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].kind, TagKind::PropertyRead);
        assert_eq!(props[0].name, "$name");

        let methods: Vec<_> = doc.method_tags().collect();
        assert_eq!(methods.len(), 2);
        assert!(methods[0].is_static);
        assert_eq!(methods[0].type_string, "Foo");
        assert_eq!(methods[0].name, "create");
        assert_eq!(methods[0].parameters.len(), 2);
        assert_eq!(methods[0].parameters[1].default.as_deref(), Some("[]"));
        assert_eq!(methods[1].type_string, "void");
        assert!(methods[1].parameters.is_empty());
    }

    #[test]
    fn malformed_tags_are_dropped() {
        let doc = PhpDoc::parse("/** @param $missingType\n * @return */");
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn inherit_doc_flag() {
        assert!(PhpDoc::parse("/** {@inheritDoc} */").inherit_doc);
        assert!(!PhpDoc::parse("/** plain */").inherit_doc);
    }
}
