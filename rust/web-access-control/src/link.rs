//! Parsing of `Link` header values per the RFC 8288 shape:
//!
//! ```text
//! Link       = #link-value
//! link-value = "<" URI-Reference ">" *( OWS ";" OWS link-param )
//! link-param = token BWS [ "=" BWS ( token / quoted-string ) ]
//! ```
//!
//! Only the `rel="acl"` relation is of interest here; everything else is
//! passed over, and malformed link-values are skipped rather than rejected.

/// All URI-references of link-values carrying a `rel="acl"` parameter, in
/// the order the header values were returned by the transport.
pub fn acl_link_targets<'a, I>(values: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(split_link_values)
        .filter_map(parse_acl_link_value)
}

/// Find the URI-reference of the first link-value carrying a `rel="acl"`
/// parameter. Returns `None` when no value matches.
pub fn acl_link_target<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    acl_link_targets(values).next()
}

/// Split a header value into its comma-separated link-values, leaving
/// commas inside `<...>` targets alone.
fn split_link_values(header: &str) -> Vec<&str> {
    let mut values = Vec::new();
    let mut start = 0;
    let mut in_target = false;

    for (index, character) in header.char_indices() {
        match character {
            '<' => in_target = true,
            '>' => in_target = false,
            ',' if !in_target => {
                values.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    values.push(&header[start..]);
    values
}

/// Parse a single link-value, producing its target when one of its
/// parameters is an `acl` relation.
fn parse_acl_link_value(value: &str) -> Option<String> {
    let mut parts = value
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty());

    let target = parts.next()?;
    let target = target.strip_prefix('<')?.strip_suffix('>')?;
    if target.is_empty() {
        return None;
    }

    parts
        .any(is_acl_relation)
        .then(|| target.to_owned())
}

/// Whether a link-param is `rel=acl`, allowing optional quotes and optional
/// whitespace around the `=`. A quoted relation value may carry several
/// whitespace-separated relation types.
fn is_acl_relation(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    if !name.trim().eq_ignore_ascii_case("rel") {
        return false;
    }
    value
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .any(|relation| relation.eq_ignore_ascii_case("acl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_finds_the_acl_link_target() {
        assert_eq!(
            acl_link_target([r#"<.acl>; rel="acl""#]),
            Some(".acl".to_owned())
        );
        assert_eq!(
            acl_link_target([r#"<https://host/a.acl>; rel=acl"#]),
            Some("https://host/a.acl".to_owned())
        );
    }

    #[test]
    fn it_tolerates_whitespace_and_missing_quotes() {
        assert_eq!(
            acl_link_target([r#"<a.acl> ;  rel = acl"#]),
            Some("a.acl".to_owned())
        );
        assert_eq!(
            acl_link_target([r#"<a.acl>;rel= "acl""#]),
            Some("a.acl".to_owned())
        );
    }

    #[test]
    fn it_skips_non_acl_relations() {
        assert_eq!(acl_link_target([r#"<style.css>; rel="stylesheet""#]), None);
        assert_eq!(acl_link_target([r#"<a.acl>; type="text/turtle""#]), None);
        assert_eq!(acl_link_target([r#"<a.acl>"#]), None);
    }

    #[test]
    fn it_skips_malformed_link_values_silently() {
        assert_eq!(acl_link_target([r#"a.acl; rel="acl""#]), None);
        assert_eq!(acl_link_target([r#"<>; rel="acl""#]), None);
        assert_eq!(
            acl_link_target([r#"garbage, <a.acl>; rel="acl""#]),
            Some("a.acl".to_owned())
        );
    }

    #[test]
    fn it_returns_the_first_match_in_transport_order() {
        let headers = [
            r#"<style.css>; rel="stylesheet""#,
            r#"<first.acl>; rel="acl""#,
            r#"<second.acl>; rel="acl""#,
        ];
        assert_eq!(acl_link_target(headers), Some("first.acl".to_owned()));
    }

    #[test]
    fn it_yields_every_matching_target_in_order() {
        let headers = [
            r#"<first.acl>; rel="acl", <style.css>; rel="stylesheet""#,
            r#"<second.acl>; rel="acl""#,
        ];
        let targets: Vec<String> = acl_link_targets(headers).collect();
        assert_eq!(targets, ["first.acl", "second.acl"]);
    }

    #[test]
    fn it_splits_comma_joined_link_values() {
        assert_eq!(
            acl_link_target([r#"<style.css>; rel="stylesheet", <a.acl>; rel="acl""#]),
            Some("a.acl".to_owned())
        );
    }

    #[test]
    fn it_recognizes_multi_relation_values() {
        assert_eq!(
            acl_link_target([r#"<a.acl>; rel="meta acl""#]),
            Some("a.acl".to_owned())
        );
    }
}
