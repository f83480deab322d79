/// Path of the sign-in page.
pub const SIGNIN_PATH: &str = "/signin";

/// Path of the sign-up page.
pub const SIGNUP_PATH: &str = "/signup";

/// Root of the protected dashboard subtree (prefix match).
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Where unauthenticated users are sent when they hit a protected page.
pub const UNAUTHENTICATED_REDIRECT: &str = SIGNIN_PATH;

/// Where authenticated users are sent when they hit an auth page.
pub const AUTHENTICATED_REDIRECT: &str = DASHBOARD_PATH;

/// Where the client lands after signing out.
pub const SIGNOUT_REDIRECT: &str = "/";

/// Query parameter carrying the originally requested path to the sign-in page.
pub const REDIRECT_PATH_PARAM: &str = "redirectTo";
