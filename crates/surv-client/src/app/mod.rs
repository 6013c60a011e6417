/*
[INPUT]:  Backend client, Lemma adapter, auth store
[OUTPUT]: Routing, notifications, login flow, session monitoring
[POS]:    App layer - client-side application logic
[UPDATE]: When flows or routes are added
*/

pub mod login;
pub mod navigator;
pub mod notify;
pub mod session;

pub use login::{Affordance, CANCELLED_MESSAGE, LoginFlow, LoginOutcome, LoginState, WELCOME_MESSAGE};
pub use navigator::{HOME_ROUTE, LOGIN_ROUTE, Navigator, TECHNICIAN_HOME_ROUTE, resolve_route};
pub use notify::{Notifier, RecordingNotifier, ToastLevel, TracingNotifier};
pub use session::{SESSION_EXPIRED_MESSAGE, SessionManager, SessionMonitor};
