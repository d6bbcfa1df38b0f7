use actix_web::{http::header::ContentType, web, HttpResponse};

const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const TREE_PAGE: &str = include_str!("../../templates/tree.html");
const COUNSELOR_PAGE: &str = include_str!("../../templates/counselor.html");
const CLASS_PAGE: &str = include_str!("../../templates/class.html");

fn html(body: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body.into())
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub async fn index() -> HttpResponse {
    html(INDEX_PAGE)
}

pub async fn tree() -> HttpResponse {
    html(TREE_PAGE)
}

pub async fn counselor() -> HttpResponse {
    html(COUNSELOR_PAGE)
}

/// GET /class/{classId}
pub async fn class_page(path: web::Path<String>) -> HttpResponse {
    html(CLASS_PAGE.replace("{{class_id}}", &escape_html(&path.into_inner())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_app;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, read_body, TestRequest};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<script>"x"&'y'"#), "&lt;script&gt;&quot;x&quot;&amp;&#x27;y&#x27;");
        assert_eq!(escape_html("bio-101"), "bio-101");
    }

    #[actix_web::test]
    async fn test_pages_render() {
        let app = test_app().await;
        for uri in ["/", "/tree", "/counselor"] {
            let resp = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
            assert_eq!(resp.headers().get("content-type").unwrap(), "text/html; charset=utf-8");
        }
    }

    #[actix_web::test]
    async fn test_class_page_embeds_escaped_id() {
        let app = test_app().await;
        let req = TestRequest::get().uri("/class/bio%3Cb%3E").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = read_body(resp).await;
        let page = std::str::from_utf8(&body).unwrap();
        assert!(page.contains(r#"data-class-id="bio&lt;b&gt;""#));
        assert!(!page.contains("{{class_id}}"));
    }
}
