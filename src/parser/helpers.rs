//! Tree-sitter node helpers shared by the PHP extractors

/// Get the text content of a node
pub fn get_text<'a>(node: &tree_sitter::Node<'a>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Get text from a named field in a node
pub fn get_field_text<'a>(
    node: &tree_sitter::Node<'a>,
    field: &str,
    source: &'a str,
) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| get_text(&n, source))
        .map(|s| s.to_string())
}

/// 1-based start line of a node
pub fn line_of(node: &tree_sitter::Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Calculate cyclomatic complexity for a method body
pub fn calculate_complexity(node: &tree_sitter::Node) -> u32 {
    let mut complexity = 1u32;
    let mut cursor = node.walk();

    fn count_branches(cursor: &mut tree_sitter::TreeCursor, complexity: &mut u32) {
        loop {
            let node = cursor.node();
            match node.kind() {
                "if_statement"
                | "else_if_clause"
                | "while_statement"
                | "do_statement"
                | "for_statement"
                | "foreach_statement"
                | "case_statement"
                | "catch_clause"
                | "conditional_expression"
                | "match_conditional_expression" => {
                    *complexity += 1;
                }
                "binary_expression" => {
                    if let Some(op) = node.child_by_field_name("operator") {
                        let kind = op.kind();
                        if kind == "&&" || kind == "||" || kind == "and" || kind == "or" || kind == "??"
                        {
                            *complexity += 1;
                        }
                    }
                }
                _ => {}
            }

            if cursor.goto_first_child() {
                count_branches(cursor, complexity);
                cursor.goto_parent();
            }

            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    count_branches(&mut cursor, &mut complexity);
    complexity
}

/// Extract the `/** ... */` comment directly preceding a declaration
pub fn get_php_doc(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let mut prev = node.prev_sibling();

    while let Some(sibling) = prev {
        if sibling.kind() == "comment" {
            let text = get_text(&sibling, source)?;
            if text.starts_with("/**") {
                let doc = text
                    .trim_start_matches("/**")
                    .trim_end_matches("*/")
                    .lines()
                    .map(|l| l.trim().trim_start_matches('*').trim())
                    .filter(|l| !l.is_empty() && !l.starts_with('@'))
                    .collect::<Vec<_>>()
                    .join("\n");
                return if doc.is_empty() { None } else { Some(doc) };
            }
        } else if sibling.kind() != "attribute_list" {
            break;
        }
        prev = sibling.prev_sibling();
    }

    None
}

/// Find a child node by kind
pub fn find_child_by_kind<'a>(
    node: &tree_sitter::Node<'a>,
    kind: &str,
) -> Option<tree_sitter::Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Check if a node has a child of a specific kind
pub fn has_child_kind(node: &tree_sitter::Node, kind: &str) -> bool {
    node.children(&mut node.walk()).any(|c| c.kind() == kind)
}

/// Named children whose kind is one of `kinds`
pub fn named_children_of_kinds<'a>(
    node: &tree_sitter::Node<'a>,
    kinds: &[&str],
) -> Vec<tree_sitter::Node<'a>> {
    node.named_children(&mut node.walk())
        .filter(|c| kinds.contains(&c.kind()))
        .collect()
}

/// Strip the surrounding quotes of a PHP string literal
pub fn unquote(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix('b').filter(|t| t.starts_with(['\'', '"'])).unwrap_or(text);
    if text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')))
    {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'posts'"), "posts");
        assert_eq!(unquote("\"posts\""), "posts");
        assert_eq!(unquote("posts"), "posts");
        assert_eq!(unquote("''"), "");
    }
}
