use crate::config::Service;
use crate::routing::RouteRule;
use crate::settings::SettingsMap;

/// Hook run on every assembled rule, after the settings have been applied.
///
/// Receives the raw document and operation extension maps so custom `x-*`
/// keys can be turned into routing behaviour.
pub trait RouteCustomizer: Send + Sync {
    fn customize(
        &self,
        rule: &mut RouteRule,
        service: &Service,
        document_extensions: &SettingsMap,
        operation_extensions: &SettingsMap,
    );
}

impl<F> RouteCustomizer for F
where
    F: Fn(&mut RouteRule, &Service, &SettingsMap, &SettingsMap) + Send + Sync,
{
    fn customize(
        &self,
        rule: &mut RouteRule,
        service: &Service,
        document_extensions: &SettingsMap,
        operation_extensions: &SettingsMap,
    ) {
        self(rule, service, document_extensions, operation_extensions)
    }
}
