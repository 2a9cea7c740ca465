use std::env;

/// Expands `%NAME%` references the way `ExpandEnvironmentStrings` does:
/// names are looked up in the process environment, unknown names and
/// unterminated `%` are left untouched.
pub fn expand_environment_strings(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => {
                        out.push_str(&value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        // Keep the opening '%' and retry from the closing one,
                        // which may start a valid reference.
                        out.push('%');
                        out.push_str(name);
                        rest = &after[end..];
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn lookup(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    env::var(name).ok()
}
