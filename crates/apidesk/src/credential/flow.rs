// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three OAuth2 dialects spoken by the supported authorization servers.

use crate::credential::oauth::{
    basic_auth, endpoint, send_token_request, TokenRequest, TokenResponse,
};
use crate::credential::{mask_prefix, mask_secret, resolve, CredentialBag};

const ENTERPRISE_SCOPE: &str = "urn:opc:hgbu:ws:__myscopes__";
const IDENTITY_SCOPE: &str = "urn:opc:idm:__myscopes__";

const HOST_KEYS: &[&str] = &["HostName", "HOSTNAME", "hostname", "Host"];
const APP_KEY_KEYS: &[&str] = &["AppKey", "APP_KEY", "appKey", "x-app-key"];
const CLIENT_ID_KEYS: &[&str] = &["ClientId", "CLIENT_ID", "clientId", "client_id"];
const CLIENT_SECRET_KEYS: &[&str] =
    &["ClientSecret", "CLIENT_SECRET", "clientSecret", "client_secret"];
const ENTERPRISE_ID_KEYS: &[&str] = &["EnterpriseId", "ENTERPRISE_ID", "enterpriseId"];
const USERNAME_KEYS: &[&str] = &["Username", "USERNAME", "username"];
const PASSWORD_KEYS: &[&str] = &["Password", "PASSWORD", "password"];
const IDCS_HOST_KEYS: &[&str] = &["IDCSHostName", "IDCS_HOSTNAME", "idcsHostName"];
const APP_ID_KEYS: &[&str] = &["APPId", "APP_ID", "appId", "ClientId", "CLIENT_ID"];
const APP_SECRET_KEYS: &[&str] =
    &["APPSecret", "APP_SECRET", "appSecret", "ClientSecret", "CLIENT_SECRET"];

/// A concrete token acquisition dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFlow {
    /// Client credentials with app key and optional enterprise id.
    EnterpriseClientCredentials,
    /// Resource-owner password grant with app key.
    ResourceOwnerPassword,
    /// Client credentials against the identity domain token endpoint.
    IdentityDomain,
}

impl TokenFlow {
    /// Select the flow for a UI-facing environment identifier.
    ///
    /// Closed switch: unknown identifiers return `None` and no flow runs.
    pub fn for_environment(environment: &str) -> Option<Self> {
        match environment {
            "opera_cloud" | "property" | "workflows" | "nor1" => {
                Some(Self::EnterpriseClientCredentials)
            }
            "distribution" => Some(Self::ResourceOwnerPassword),
            "ra_storage" | "ra_data" => Some(Self::IdentityDomain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnterpriseClientCredentials => "enterprise_client_credentials",
            Self::ResourceOwnerPassword => "resource_owner_password",
            Self::IdentityDomain => "identity_domain",
        }
    }

    /// Build the token endpoint call for this dialect from a credential bag.
    pub fn build_request(&self, creds: &CredentialBag) -> TokenRequest {
        match self {
            Self::EnterpriseClientCredentials => enterprise_request(creds),
            Self::ResourceOwnerPassword => password_request(creds),
            Self::IdentityDomain => identity_request(creds),
        }
    }

    /// Run the flow once against its authorization server.
    pub async fn acquire(
        &self,
        client: &reqwest::Client,
        creds: &CredentialBag,
    ) -> anyhow::Result<TokenResponse> {
        let request = self.build_request(creds);
        tracing::info!(
            flow = self.as_str(),
            url = %request.url,
            headers = ?request.headers.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "requesting token"
        );
        send_token_request(client, &request).await
    }
}

fn enterprise_request(creds: &CredentialBag) -> TokenRequest {
    let host = resolve(creds, HOST_KEYS);
    let app_key = resolve(creds, APP_KEY_KEYS);
    let client_id = resolve(creds, CLIENT_ID_KEYS);
    let client_secret = resolve(creds, CLIENT_SECRET_KEYS);
    let enterprise_id = resolve(creds, ENTERPRISE_ID_KEYS);

    tracing::debug!(
        app_key = %mask_prefix(&app_key),
        client_id = %mask_prefix(&client_id),
        client_secret = mask_secret(&client_secret),
        enterprise_id = if enterprise_id.is_empty() { "MISSING" } else { enterprise_id.as_str() },
        "enterprise token credentials"
    );

    let mut headers = vec![
        ("x-app-key".to_owned(), app_key),
        ("Authorization".to_owned(), basic_auth(&client_id, &client_secret)),
    ];
    if !enterprise_id.is_empty() {
        headers.push(("enterpriseId".to_owned(), enterprise_id));
    }

    TokenRequest {
        url: endpoint(&host, "/oauth/v1/tokens"),
        headers,
        form: vec![
            ("grant_type", "client_credentials".to_owned()),
            ("scope", ENTERPRISE_SCOPE.to_owned()),
        ],
    }
}

fn password_request(creds: &CredentialBag) -> TokenRequest {
    // Distribution bags never used the short `Host`/`x-app-key`/`client_id` spellings.
    let host = resolve(creds, &HOST_KEYS[..3]);
    let app_key = resolve(creds, &APP_KEY_KEYS[..3]);
    let client_id = resolve(creds, &CLIENT_ID_KEYS[..3]);
    let client_secret = resolve(creds, &CLIENT_SECRET_KEYS[..3]);
    let username = resolve(creds, USERNAME_KEYS);
    let password = resolve(creds, PASSWORD_KEYS);

    tracing::debug!(
        app_key = mask_secret(&app_key),
        client_id = mask_secret(&client_id),
        username = %mask_prefix(&username),
        "distribution token credentials"
    );

    TokenRequest {
        url: endpoint(&host, "/hdpba/oauth2/v1/token"),
        headers: vec![
            ("x-app-key".to_owned(), app_key),
            ("Authorization".to_owned(), basic_auth(&client_id, &client_secret)),
        ],
        form: vec![
            ("username", username),
            ("password", password),
            ("grant_type", "password".to_owned()),
        ],
    }
}

fn identity_request(creds: &CredentialBag) -> TokenRequest {
    let host = resolve(creds, IDCS_HOST_KEYS);
    let app_id = resolve(creds, APP_ID_KEYS);
    let app_secret = resolve(creds, APP_SECRET_KEYS);

    tracing::debug!(app_id = mask_secret(&app_id), "identity domain token credentials");

    TokenRequest {
        url: endpoint(&host, "/oauth2/v1/token"),
        headers: vec![("Authorization".to_owned(), basic_auth(&app_id, &app_secret))],
        form: vec![
            ("grant_type", "client_credentials".to_owned()),
            ("scope", IDENTITY_SCOPE.to_owned()),
        ],
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
