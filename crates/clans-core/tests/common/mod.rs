use clans_core::{PlansClient, PlansClientBuilder};
use clans_test_utils::FakePlans;

/// Helper function to create a client pointed at a fake server
pub fn client_for(server: &FakePlans) -> PlansClient {
    PlansClientBuilder::new()
        .with_base_url(Some(server.base_url()))
        .build()
        .expect("Failed to build client")
}

/// Helper function to create a client logged in as baldwint
pub async fn logged_in(server: &FakePlans) -> PlansClient {
    let mut client = client_for(server);
    let accepted = client
        .login("baldwint", "hunter2")
        .await
        .expect("Failed to reach server");
    assert!(accepted, "login rejected");
    client
}
