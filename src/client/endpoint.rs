//! Closed enumeration of upstream endpoints.
//!
//! Collectors identify the endpoint they're calling by variant rather than
//! by a raw path string, so the retry policy and error metrics can key on
//! a `Copy` label instead of `String` comparisons.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointId {
    Organizations,
    Networks,
    Devices,
    DeviceStatuses,
    DeviceMemoryHistory,
    SensorReadings,
    ApiUsage,
    License,
    ClientOverview,
    ApplicationUsage,
    SwitchPortStatuses,
    WirelessClientCount,
    WirelessChannelUtilization,
    ApplianceUplinkStatuses,
    ApplianceVpnStatuses,
    CameraStatuses,
    CellularGatewayStatuses,
    NetworkHealthRf,
    NetworkHealthConnectionStats,
    NetworkHealthDataRates,
    NetworkHealthBluetooth,
    AssuranceAlerts,
    Clients,
    LoginSecurity,
    ConfigurationChanges,
}

impl EndpointId {
    /// Whether upstream is allowed to return 404/"not available" for this
    /// endpoint without the collector treating it as a failure (e.g. a
    /// network with no sensors enabled).
    pub const fn optional(self) -> bool {
        matches!(
            self,
            EndpointId::SensorReadings
                | EndpointId::AssuranceAlerts
                | EndpointId::NetworkHealthBluetooth
        )
    }

    pub const fn as_label(self) -> &'static str {
        match self {
            EndpointId::Organizations => "organizations",
            EndpointId::Networks => "networks",
            EndpointId::Devices => "devices",
            EndpointId::DeviceStatuses => "device_statuses",
            EndpointId::DeviceMemoryHistory => "device_memory_history",
            EndpointId::SensorReadings => "sensor_readings",
            EndpointId::ApiUsage => "api_usage",
            EndpointId::License => "license",
            EndpointId::ClientOverview => "client_overview",
            EndpointId::ApplicationUsage => "application_usage",
            EndpointId::SwitchPortStatuses => "switch_port_statuses",
            EndpointId::WirelessClientCount => "wireless_client_count",
            EndpointId::WirelessChannelUtilization => "wireless_channel_utilization",
            EndpointId::ApplianceUplinkStatuses => "appliance_uplink_statuses",
            EndpointId::ApplianceVpnStatuses => "appliance_vpn_statuses",
            EndpointId::CameraStatuses => "camera_statuses",
            EndpointId::CellularGatewayStatuses => "cellular_gateway_statuses",
            EndpointId::NetworkHealthRf => "network_health_rf",
            EndpointId::NetworkHealthConnectionStats => "network_health_connection_stats",
            EndpointId::NetworkHealthDataRates => "network_health_data_rates",
            EndpointId::NetworkHealthBluetooth => "network_health_bluetooth",
            EndpointId::AssuranceAlerts => "assurance_alerts",
            EndpointId::Clients => "clients",
            EndpointId::LoginSecurity => "login_security",
            EndpointId::ConfigurationChanges => "configuration_changes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_endpoints_are_optional() {
        let optional: Vec<_> = [
            EndpointId::Organizations,
            EndpointId::SensorReadings,
            EndpointId::AssuranceAlerts,
            EndpointId::NetworkHealthBluetooth,
            EndpointId::Devices,
        ]
        .into_iter()
        .filter(|e| e.optional())
        .collect();
        assert_eq!(optional.len(), 3);
    }
}
