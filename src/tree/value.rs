use std::collections::HashMap;

/// Materialized registry subtree: value and subkey names of one key.
pub type Node = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    /// REG_DWORD, REG_DWORD_BIG_ENDIAN and REG_QWORD, widened without loss
    Integer(u64),
    Strings(Vec<String>),
    Bytes(Vec<u8>),
    Node(Node),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// Follows a dotted path (`SubKeyA.IntVal`) through nested nodes.
pub fn lookup<'a>(
    node: &'a Node,
    dotted: &str,
) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut current = node.get(parts.next()?)?;
    for part in parts {
        current = current.as_node()?.get(part)?;
    }
    Some(current)
}

/// Every leaf of `node` as a dotted path, sorted. Subkeys without any
/// values show up under their own name.
pub fn dotted_keys(node: &Node) -> Vec<String> {
    fn walk(
        node: &Node,
        prefix: &str,
        out: &mut Vec<String>,
    ) {
        for (name, value) in node {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match value {
                Value::Node(child) if !child.is_empty() => walk(child, &path, out),
                _ => out.push(path),
            }
        }
    }

    let mut out = Vec::new();
    walk(node, "", &mut out);
    out.sort();
    out
}
