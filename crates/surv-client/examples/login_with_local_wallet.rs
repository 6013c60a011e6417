/*
[INPUT]:  A running Surv backend (SURV_API_URL, default http://localhost:8000)
[OUTPUT]: Console output of the login flow and the signed-in user's jobs
[POS]:    Examples - wallet login demonstration
[UPDATE]: When LoginFlow or LocalWalletLoader API changes
*/

//! Example: sign in with a file-backed wallet
//!
//! Creates a wallet under `./.surv-example/wallet` on first run, verifies it
//! with the backend and lists the jobs visible to the resulting user.

use std::sync::Arc;

use surv_client::{
    AuthStore, DEFAULT_BASE_URL, JobQuery, LemmaAuth, LocalStore, LocalWalletLoader, LoginFlow,
    LoginOutcome, Navigator, SurvClient, TracingNotifier,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("SURV_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    // Step 1: storage, backend client and wallet adapter
    let storage = LocalStore::open("./.surv-example/storage.json")?;
    let client = SurvClient::new(&base_url, AuthStore::new(storage.clone()), Navigator::default())?;
    let loader = Arc::new(LocalWalletLoader::new("./.surv-example/wallet").with_scopes(vec!["*".to_string()]));
    let lemma = Arc::new(LemmaAuth::new(loader, storage));

    println!("=== Surv Wallet Login Example ===");

    // Step 2: silent sign-in, falling back to the interactive path
    let flow = LoginFlow::new(client.clone(), lemma, Arc::new(TracingNotifier));
    let mut outcome = flow.start().await;
    if let LoginOutcome::NeedsInteraction(affordance) = outcome {
        println!("Wallet needs attention: {affordance:?}");
        outcome = flow.sign_in().await;
    }

    let user = match outcome {
        LoginOutcome::Authenticated(user) => user,
        other => {
            println!("Login did not complete: {other:?}");
            return Ok(());
        }
    };
    println!("Signed in as {} ({:?})", user.email, user.role);

    // Step 3: an authenticated request
    let jobs = client.list_jobs(&JobQuery::default()).await?;
    println!("{} job(s) visible", jobs.len());
    for job in jobs.iter().take(5) {
        println!("  - {} [{:?}] {}", job.id, job.status, job.title);
    }

    Ok(())
}
