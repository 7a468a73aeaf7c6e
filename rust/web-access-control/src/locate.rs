use url::Url;

use crate::link::acl_link_targets;
use crate::{AccessControlError, Request, Transport};

/// Discover the ACL document governing `resource` with a single metadata
/// probe.
///
/// The resource is probed with a HEAD request and its `Link` headers are
/// scanned for `rel="acl"` values. The first matching URI-reference that
/// resolves against the probed resource (directory-relative, per RFC
/// 3986) wins, so `<.acl>` on `https://host/a/b` names
/// `https://host/a/.acl` while an absolute reference names itself. A
/// reference that fails to resolve is treated like any other malformed
/// link-value and skipped in favor of later matches.
///
/// Returns `None` when no matching link resolved; the caller falls back
/// to the container walk.
pub(crate) async fn locate_acl_document<T>(
    transport: &T,
    resource: &Url,
) -> Result<Option<Url>, AccessControlError>
where
    T: Transport + ?Sized,
{
    let response = transport.fetch(Request::head(resource.clone())).await?;

    Ok(acl_link_targets(response.header_values("link"))
        .find_map(|target| resource.join(&target).ok()))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::Response;

    struct StaticTransport {
        response: Response,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn fetch(&self, request: Request) -> Result<Response, AccessControlError> {
            assert_eq!(request.method.as_str(), "HEAD");
            Ok(self.response.clone())
        }
    }

    fn url(input: &str) -> Url {
        Url::parse(input).unwrap()
    }

    #[tokio::test]
    async fn it_resolves_relative_links_against_the_resource_directory() {
        let transport = StaticTransport {
            response: Response::new(200).with_header("Link", r#"<.acl>; rel="acl""#),
        };

        let located = locate_acl_document(&transport, &url("https://host/a/b"))
            .await
            .unwrap();
        assert_eq!(located, Some(url("https://host/a/.acl")));

        let located = locate_acl_document(&transport, &url("https://host/a/"))
            .await
            .unwrap();
        assert_eq!(located, Some(url("https://host/a/.acl")));
    }

    #[tokio::test]
    async fn it_passes_absolute_links_through() {
        let transport = StaticTransport {
            response: Response::new(200)
                .with_header("Link", r#"<https://elsewhere/root.acl>; rel="acl""#),
        };

        let located = locate_acl_document(&transport, &url("https://host/a"))
            .await
            .unwrap();
        assert_eq!(located, Some(url("https://elsewhere/root.acl")));
    }

    #[tokio::test]
    async fn it_skips_unresolvable_references_in_favor_of_later_matches() {
        let transport = StaticTransport {
            response: Response::new(200)
                .with_header("Link", r#"<http://>; rel="acl""#)
                .with_header("Link", r#"<fallback.acl>; rel="acl""#),
        };

        let located = locate_acl_document(&transport, &url("https://host/a"))
            .await
            .unwrap();
        assert_eq!(located, Some(url("https://host/fallback.acl")));
    }

    #[tokio::test]
    async fn it_reports_no_location_when_no_link_matches() {
        let transport = StaticTransport {
            response: Response::new(200).with_header("Link", r#"<style.css>; rel="stylesheet""#),
        };

        let located = locate_acl_document(&transport, &url("https://host/a"))
            .await
            .unwrap();
        assert_eq!(located, None);
    }
}
