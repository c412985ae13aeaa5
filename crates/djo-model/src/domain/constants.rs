//! Well-known names shared by the model and the transports.

/// API group of the desired-state resources.
pub const API_GROUP: &str = "django.djangooperator";

/// API version of the desired-state resources.
pub const API_VERSION: &str = "v1alpha1";

/// Label convention used by the chart to mark the application server pods.
///
/// The operator execs into the first live pod that carries these labels.
pub const DEFAULT_POD_SELECTOR: &str = "app=django-server";
