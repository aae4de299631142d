//! ApiClient behavior against a mock Reply.sh backend.

use reply_core::api::{ApiClient, ApiError};
use reply_core::models::{AuthResult, Credential, User};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(&server.uri()).expect("mock server URI is a valid base")
}

fn token() -> Credential {
    Credential::new("tkn1")
}

fn website_json(id: &str, domain: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u1",
        "domain": domain,
        "created_at": "2024-03-05T10:00:00Z",
        "updated_at": "2024-03-05T10:00:00Z"
    })
}

#[derive(Debug, Clone, Copy)]
enum Op {
    ExchangeOAuthCode,
    LoginWithPassword,
    RequestOneTimeCode,
    VerifyOneTimeCode,
    FetchCurrentUser,
    ListWebsites,
    CreateWebsite,
    DeleteWebsite,
}

const ALL_OPS: [Op; 8] = [
    Op::ExchangeOAuthCode,
    Op::LoginWithPassword,
    Op::RequestOneTimeCode,
    Op::VerifyOneTimeCode,
    Op::FetchCurrentUser,
    Op::ListWebsites,
    Op::CreateWebsite,
    Op::DeleteWebsite,
];

impl Op {
    fn route(self) -> (&'static str, &'static str) {
        match self {
            Op::ExchangeOAuthCode => ("POST", "/auth/google"),
            Op::LoginWithPassword => ("POST", "/auth/login"),
            Op::RequestOneTimeCode => ("POST", "/auth/otp/request"),
            Op::VerifyOneTimeCode => ("POST", "/auth/otp/verify"),
            Op::FetchCurrentUser => ("GET", "/auth/me"),
            Op::ListWebsites => ("GET", "/websites"),
            Op::CreateWebsite => ("POST", "/websites"),
            Op::DeleteWebsite => ("DELETE", "/websites/w1"),
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Op::ExchangeOAuthCode => "Authentication failed",
            Op::LoginWithPassword => "Login failed",
            Op::RequestOneTimeCode => "Failed to send OTP",
            Op::VerifyOneTimeCode => "OTP verification failed",
            Op::FetchCurrentUser => "Failed to get user info",
            Op::ListWebsites => "Failed to get websites",
            Op::CreateWebsite => "Failed to add website",
            Op::DeleteWebsite => "Failed to delete website",
        }
    }

    /// Run the operation and return its error
    async fn fail(self, api: &ApiClient) -> ApiError {
        let result = match self {
            Op::ExchangeOAuthCode => api.exchange_oauth_code("code", "http://localhost/cb").await.map(drop),
            Op::LoginWithPassword => api.login_with_password("a@b.com", "pw").await.map(drop),
            Op::RequestOneTimeCode => api.request_one_time_code("a@b.com").await.map(drop),
            Op::VerifyOneTimeCode => api.verify_one_time_code("a@b.com", "123456").await.map(drop),
            Op::FetchCurrentUser => api.fetch_current_user(&token()).await.map(drop),
            Op::ListWebsites => api.list_websites(&token()).await.map(drop),
            Op::CreateWebsite => api.create_website(&token(), "example.com").await.map(drop),
            Op::DeleteWebsite => api.delete_website(&token(), "w1").await,
        };
        match result {
            Ok(()) => panic!("{:?} should have failed", self),
            Err(e) => e,
        }
    }
}

#[tokio::test]
async fn every_operation_surfaces_error_payload_message() {
    for op in ALL_OPS {
        let server = MockServer::start().await;
        let (verb, route) = op.route();
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "X" })))
            .expect(1)
            .mount(&server)
            .await;

        let err = op.fail(&client(&server)).await;
        assert_eq!(err.to_string(), "X", "{:?}", op);
    }
}

#[tokio::test]
async fn every_operation_falls_back_on_unparseable_body() {
    for op in ALL_OPS {
        let server = MockServer::start().await;
        let (verb, route) = op.route();
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = op.fail(&client(&server)).await;
        assert_eq!(err.to_string(), op.fallback(), "{:?}", op);
    }
}

#[tokio::test]
async fn every_operation_falls_back_on_empty_body() {
    for op in ALL_OPS {
        let server = MockServer::start().await;
        let (verb, route) = op.route();
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = op.fail(&client(&server)).await;
        assert_eq!(err.to_string(), op.fallback(), "{:?}", op);
    }
}

#[tokio::test]
async fn password_login_rejected_with_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "wrong" })))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .login_with_password("a@b.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn verify_one_time_code_returns_exact_auth_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/otp/verify"))
        .and(body_json(json!({ "email": "a@b.com", "otp": "000000" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tkn1",
            "user": { "id": "u1", "email": "a@b.com", "name": null, "picture": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .verify_one_time_code("a@b.com", "000000")
        .await
        .unwrap();
    assert_eq!(
        result,
        AuthResult {
            token: Credential::new("tkn1"),
            user: User {
                id: "u1".to_string(),
                email: "a@b.com".to_string(),
                name: None,
                picture: None,
            },
        }
    );
}

#[tokio::test]
async fn oauth_exchange_sends_code_and_redirect_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/google"))
        .and(body_json(json!({ "code": "4/abc", "redirectUri": "http://localhost:9876/auth/callback" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tkn-google",
            "user": { "id": "u2", "email": "g@b.com", "name": "G", "picture": "https://img/p.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .exchange_oauth_code("4/abc", "http://localhost:9876/auth/callback")
        .await
        .unwrap();
    assert_eq!(result.token.as_str(), "tkn-google");
    assert_eq!(result.user.name.as_deref(), Some("G"));
}

#[tokio::test]
async fn request_one_time_code_returns_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/otp/request"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OTP sent" })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client(&server).request_one_time_code("a@b.com").await.unwrap();
    assert_eq!(ack.message, "OTP sent");
}

#[tokio::test]
async fn expired_credential_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expired" })))
        .mount(&server)
        .await;

    let err = client(&server).fetch_current_user(&token()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Token expired");
}

#[tokio::test]
async fn credential_is_sent_verbatim() {
    let server = MockServer::start().await;
    let raw = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.c2ln";
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", format!("Bearer {}", raw).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "a@b.com", "name": "Ada", "picture": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client(&server)
        .fetch_current_user(&Credential::new(raw))
        .await
        .unwrap();
    assert_eq!(user.display_name(), "Ada");
}

#[tokio::test]
async fn created_website_shows_up_in_next_listing() {
    let server = MockServer::start().await;

    // First listing: nothing registered yet
    Mock::given(method("GET"))
        .and(path("/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/websites"))
        .and(header("authorization", "Bearer tkn1"))
        .and(body_json(json!({ "domain": "example.com" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "website": website_json("w1", "example.com") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/websites"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "websites": [website_json("w1", "example.com")] })),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    assert!(api.list_websites(&token()).await.unwrap().is_empty());

    let created = api.create_website(&token(), "example.com").await.unwrap();
    assert_eq!(created.domain, "example.com");

    let listed = api.list_websites(&token()).await.unwrap();
    assert!(listed.iter().any(|w| w.id == created.id));
}

#[tokio::test]
async fn delete_accepts_empty_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/websites/w1"))
        .and(header("authorization", "Bearer tkn1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_website(&token(), "w1").await.unwrap();
}

#[tokio::test]
async fn garbage_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).list_websites(&token()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn listing_without_websites_field_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sites": [] })))
        .mount(&server)
        .await;

    let err = client(&server).list_websites(&token()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    // Grab a free port, then release it so nothing is listening there
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let api = ApiClient::with_base_url(&format!("http://127.0.0.1:{}", port)).unwrap();
    let err = api.login_with_password("a@b.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "{:?}", err);
}
