//! The exporter's full Prometheus metric catalog.
//!
//! Every series is registered once at process start into the single
//! global [`REGISTRY`]. Collectors never touch `prometheus::GaugeVec`
//! directly — they build [`crate::types::MetricSample`] values addressed
//! by [`MetricHandle`], and `metrics::record` / the expiration manager in
//! `metrics::registry` do the label-vector bookkeeping.

use lazy_static::lazy_static;
use prometheus::{
    histogram_opts, opts, register_counter_vec, register_gauge_vec, register_histogram_vec,
    CounterVec, GaugeVec, HistogramVec, Registry,
};

/// Every metric series the exporter can emit, keyed by a `Copy` handle
/// rather than a string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricHandle {
    // --- Sensor (MT family) ---
    SensorTemperatureCelsius,
    SensorHumidityPercent,
    SensorDoorOpen,
    SensorWaterDetected,
    SensorCo2Ppm,
    SensorTvocPpb,
    SensorPm25Ugm3,
    SensorNoiseDb,
    SensorBatteryPercent,
    SensorIndoorAirQualityScore,
    SensorVoltageVolts,
    SensorCurrentAmps,
    SensorRealPowerWatts,
    SensorApparentPowerVa,
    SensorPowerFactorPercent,
    SensorFrequencyHz,
    SensorDownstreamPowerEnabled,
    SensorRemoteLockoutEnabled,

    // --- Organization ---
    OrgNetworksTotal,
    OrgDevicesTotal,
    OrgDevicesTotalByModel,
    OrgDevicesAvailabilityTotal,
    OrgApiRequestsRemaining,
    OrgLicenseState,
    OrgLicenseExpiringSoon,
    OrgLicenseSeatsTotal,
    OrgLicenseSeatsUsed,
    OrgClientsOnlineTotal,
    OrgClientsUsageBytes,
    OrgApplicationUsageBytes,

    // --- Device (all product types) ---
    DeviceUp,
    DeviceStatusInfo,
    DeviceMemoryUsedPercent,

    // --- MS ---
    SwitchPortStatus,
    SwitchPortTrafficBytes,
    SwitchPoePowerWatts,

    // --- MR ---
    WirelessClientsConnected,
    WirelessChannelUtilizationPercent,
    WirelessSsidUsageBytes,

    // --- MX ---
    ApplianceUplinkStatus,
    ApplianceVpnStatus,

    // --- MV ---
    CameraStatus,

    // --- MG ---
    CellularSignalQualityPercent,

    // --- Network health ---
    NetworkRfHealthScore,
    NetworkConnectionSuccessPercent,
    NetworkDataRateBps,
    NetworkBluetoothClientsTotal,

    // --- Alerts ---
    OrgAlertsTotal,
    NetworkHealthAlertsTotal,
    SensorAlertsTotal,

    // --- Clients (opt-in) ---
    ClientUsageBytes,
    ClientRssiDbm,
    ClientStatus,
    ClientSsidCount,
    ClientVlanCount,
    ClientDnsCacheHitsTotal,
    ClientDnsCacheMissesTotal,
    ClientDnsCacheExpiredTotal,

    // --- Config ---
    OrgLoginSecuritySetting,
    OrgLoginSecurityThreshold,
    OrgConfigChanges24hTotal,

    // --- Exporter self-instrumentation ---
    ExporterCollectorRunsTotal,
    ExporterCollectorErrorsTotal,
    ExporterCollectorDurationSeconds,
    ExporterCollectorLastSuccessTimestamp,
    ExporterSeriesExpiredTotal,
}

pub enum Vec_ {
    Gauge(&'static GaugeVec),
    Counter(&'static CounterVec),
    Histogram(&'static HistogramVec),
}

impl MetricHandle {
    /// The underlying Prometheus vector this handle writes to.
    pub fn vec(self) -> Vec_ {
        use MetricHandle::*;
        match self {
            SensorTemperatureCelsius => Vec_::Gauge(&SENSOR_TEMPERATURE_CELSIUS),
            SensorHumidityPercent => Vec_::Gauge(&SENSOR_HUMIDITY_PERCENT),
            SensorDoorOpen => Vec_::Gauge(&SENSOR_DOOR_OPEN),
            SensorWaterDetected => Vec_::Gauge(&SENSOR_WATER_DETECTED),
            SensorCo2Ppm => Vec_::Gauge(&SENSOR_CO2_PPM),
            SensorTvocPpb => Vec_::Gauge(&SENSOR_TVOC_PPB),
            SensorPm25Ugm3 => Vec_::Gauge(&SENSOR_PM25_UGM3),
            SensorNoiseDb => Vec_::Gauge(&SENSOR_NOISE_DB),
            SensorBatteryPercent => Vec_::Gauge(&SENSOR_BATTERY_PERCENT),
            SensorIndoorAirQualityScore => Vec_::Gauge(&SENSOR_INDOOR_AIR_QUALITY_SCORE),
            SensorVoltageVolts => Vec_::Gauge(&SENSOR_VOLTAGE_VOLTS),
            SensorCurrentAmps => Vec_::Gauge(&SENSOR_CURRENT_AMPS),
            SensorRealPowerWatts => Vec_::Gauge(&SENSOR_REAL_POWER_WATTS),
            SensorApparentPowerVa => Vec_::Gauge(&SENSOR_APPARENT_POWER_VA),
            SensorPowerFactorPercent => Vec_::Gauge(&SENSOR_POWER_FACTOR_PERCENT),
            SensorFrequencyHz => Vec_::Gauge(&SENSOR_FREQUENCY_HZ),
            SensorDownstreamPowerEnabled => Vec_::Gauge(&SENSOR_DOWNSTREAM_POWER_ENABLED),
            SensorRemoteLockoutEnabled => Vec_::Gauge(&SENSOR_REMOTE_LOCKOUT_ENABLED),

            OrgNetworksTotal => Vec_::Gauge(&ORG_NETWORKS_TOTAL),
            OrgDevicesTotal => Vec_::Gauge(&ORG_DEVICES_TOTAL),
            OrgDevicesTotalByModel => Vec_::Gauge(&ORG_DEVICES_TOTAL_BY_MODEL),
            OrgDevicesAvailabilityTotal => Vec_::Gauge(&ORG_DEVICES_AVAILABILITY_TOTAL),
            OrgApiRequestsRemaining => Vec_::Gauge(&ORG_API_REQUESTS_REMAINING),
            OrgLicenseState => Vec_::Gauge(&ORG_LICENSE_STATE),
            OrgLicenseExpiringSoon => Vec_::Gauge(&ORG_LICENSE_EXPIRING_SOON),
            OrgLicenseSeatsTotal => Vec_::Gauge(&ORG_LICENSE_SEATS_TOTAL),
            OrgLicenseSeatsUsed => Vec_::Gauge(&ORG_LICENSE_SEATS_USED),
            OrgClientsOnlineTotal => Vec_::Gauge(&ORG_CLIENTS_ONLINE_TOTAL),
            OrgClientsUsageBytes => Vec_::Gauge(&ORG_CLIENTS_USAGE_BYTES),
            OrgApplicationUsageBytes => Vec_::Gauge(&ORG_APPLICATION_USAGE_BYTES),

            DeviceUp => Vec_::Gauge(&DEVICE_UP),
            DeviceStatusInfo => Vec_::Gauge(&DEVICE_STATUS_INFO),
            DeviceMemoryUsedPercent => Vec_::Histogram(&DEVICE_MEMORY_USED_PERCENT),

            SwitchPortStatus => Vec_::Gauge(&SWITCH_PORT_STATUS),
            SwitchPortTrafficBytes => Vec_::Gauge(&SWITCH_PORT_TRAFFIC_BYTES),
            SwitchPoePowerWatts => Vec_::Gauge(&SWITCH_POE_POWER_WATTS),

            WirelessClientsConnected => Vec_::Gauge(&WIRELESS_CLIENTS_CONNECTED),
            WirelessChannelUtilizationPercent => Vec_::Gauge(&WIRELESS_CHANNEL_UTILIZATION_PERCENT),
            WirelessSsidUsageBytes => Vec_::Gauge(&WIRELESS_SSID_USAGE_BYTES),

            ApplianceUplinkStatus => Vec_::Gauge(&APPLIANCE_UPLINK_STATUS),
            ApplianceVpnStatus => Vec_::Gauge(&APPLIANCE_VPN_STATUS),

            CameraStatus => Vec_::Gauge(&CAMERA_STATUS),

            CellularSignalQualityPercent => Vec_::Gauge(&CELLULAR_SIGNAL_QUALITY_PERCENT),

            NetworkRfHealthScore => Vec_::Gauge(&NETWORK_RF_HEALTH_SCORE),
            NetworkConnectionSuccessPercent => Vec_::Gauge(&NETWORK_CONNECTION_SUCCESS_PERCENT),
            NetworkDataRateBps => Vec_::Gauge(&NETWORK_DATA_RATE_BPS),
            NetworkBluetoothClientsTotal => Vec_::Gauge(&NETWORK_BLUETOOTH_CLIENTS_TOTAL),

            OrgAlertsTotal => Vec_::Gauge(&ORG_ALERTS_TOTAL),
            NetworkHealthAlertsTotal => Vec_::Gauge(&NETWORK_HEALTH_ALERTS_TOTAL),
            SensorAlertsTotal => Vec_::Gauge(&SENSOR_ALERTS_TOTAL),

            ClientUsageBytes => Vec_::Gauge(&CLIENT_USAGE_BYTES),
            ClientRssiDbm => Vec_::Gauge(&CLIENT_RSSI_DBM),
            ClientStatus => Vec_::Gauge(&CLIENT_STATUS),
            ClientSsidCount => Vec_::Gauge(&CLIENT_SSID_COUNT),
            ClientVlanCount => Vec_::Gauge(&CLIENT_VLAN_COUNT),
            ClientDnsCacheHitsTotal => Vec_::Counter(&CLIENT_DNS_CACHE_HITS_TOTAL),
            ClientDnsCacheMissesTotal => Vec_::Counter(&CLIENT_DNS_CACHE_MISSES_TOTAL),
            ClientDnsCacheExpiredTotal => Vec_::Counter(&CLIENT_DNS_CACHE_EXPIRED_TOTAL),

            OrgLoginSecuritySetting => Vec_::Gauge(&ORG_LOGIN_SECURITY_SETTING),
            OrgLoginSecurityThreshold => Vec_::Gauge(&ORG_LOGIN_SECURITY_THRESHOLD),
            OrgConfigChanges24hTotal => Vec_::Gauge(&ORG_CONFIG_CHANGES_24H_TOTAL),

            ExporterCollectorRunsTotal => Vec_::Counter(&EXPORTER_COLLECTOR_RUNS_TOTAL),
            ExporterCollectorErrorsTotal => Vec_::Counter(&EXPORTER_COLLECTOR_ERRORS_TOTAL),
            ExporterCollectorDurationSeconds => Vec_::Histogram(&EXPORTER_COLLECTOR_DURATION_SECONDS),
            ExporterCollectorLastSuccessTimestamp => {
                Vec_::Gauge(&EXPORTER_COLLECTOR_LAST_SUCCESS_TIMESTAMP)
            }
            ExporterSeriesExpiredTotal => Vec_::Counter(&EXPORTER_SERIES_EXPIRED_TOTAL),
        }
    }
}

macro_rules! gauge {
    ($name:expr, $help:expr, $labels:expr) => {
        register_gauge_vec!(opts!($name, $help), $labels).unwrap()
    };
}

macro_rules! counter {
    ($name:expr, $help:expr, $labels:expr) => {
        register_counter_vec!(opts!($name, $help), $labels).unwrap()
    };
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Sensor (MT)
    pub static ref SENSOR_TEMPERATURE_CELSIUS: GaugeVec = gauge!(
        "mt_sensor_temperature_celsius", "Ambient temperature reported by an MT sensor",
        &["network_id", "serial"]);
    pub static ref SENSOR_HUMIDITY_PERCENT: GaugeVec = gauge!(
        "mt_sensor_humidity_percent", "Relative humidity reported by an MT sensor",
        &["network_id", "serial"]);
    pub static ref SENSOR_DOOR_OPEN: GaugeVec = gauge!(
        "mt_sensor_door_open", "Door sensor open state (1=open, 0=closed)",
        &["network_id", "serial"]);
    pub static ref SENSOR_WATER_DETECTED: GaugeVec = gauge!(
        "mt_sensor_water_detected", "Water detection state (1=detected)",
        &["network_id", "serial"]);
    pub static ref SENSOR_CO2_PPM: GaugeVec = gauge!(
        "mt_sensor_co2_ppm", "CO2 concentration in parts per million",
        &["network_id", "serial"]);
    pub static ref SENSOR_TVOC_PPB: GaugeVec = gauge!(
        "mt_sensor_tvoc_ppb", "Total volatile organic compounds in parts per billion",
        &["network_id", "serial"]);
    pub static ref SENSOR_PM25_UGM3: GaugeVec = gauge!(
        "mt_sensor_pm25_ugm3", "PM2.5 particulate concentration in micrograms per cubic meter",
        &["network_id", "serial"]);
    pub static ref SENSOR_NOISE_DB: GaugeVec = gauge!(
        "mt_sensor_noise_db", "Ambient noise level in decibels",
        &["network_id", "serial"]);
    pub static ref SENSOR_BATTERY_PERCENT: GaugeVec = gauge!(
        "mt_sensor_battery_percent", "Remaining sensor battery percentage",
        &["network_id", "serial"]);
    pub static ref SENSOR_INDOOR_AIR_QUALITY_SCORE: GaugeVec = gauge!(
        "mt_sensor_indoor_air_quality_score", "Composite indoor air quality score",
        &["network_id", "serial"]);
    pub static ref SENSOR_VOLTAGE_VOLTS: GaugeVec = gauge!(
        "mt_sensor_voltage_volts", "Measured line voltage",
        &["network_id", "serial"]);
    pub static ref SENSOR_CURRENT_AMPS: GaugeVec = gauge!(
        "mt_sensor_current_amps", "Measured line current",
        &["network_id", "serial"]);
    pub static ref SENSOR_REAL_POWER_WATTS: GaugeVec = gauge!(
        "mt_sensor_real_power_watts", "Measured real power",
        &["network_id", "serial"]);
    pub static ref SENSOR_APPARENT_POWER_VA: GaugeVec = gauge!(
        "mt_sensor_apparent_power_va", "Measured apparent power",
        &["network_id", "serial"]);
    pub static ref SENSOR_POWER_FACTOR_PERCENT: GaugeVec = gauge!(
        "mt_sensor_power_factor_percent", "Measured power factor",
        &["network_id", "serial"]);
    pub static ref SENSOR_FREQUENCY_HZ: GaugeVec = gauge!(
        "mt_sensor_frequency_hz", "Measured line frequency",
        &["network_id", "serial"]);
    pub static ref SENSOR_DOWNSTREAM_POWER_ENABLED: GaugeVec = gauge!(
        "mt_sensor_downstream_power_enabled", "Downstream power relay enabled (1=enabled)",
        &["network_id", "serial"]);
    pub static ref SENSOR_REMOTE_LOCKOUT_ENABLED: GaugeVec = gauge!(
        "mt_sensor_remote_lockout_enabled", "Physical button remote lockout enabled (1=enabled)",
        &["network_id", "serial"]);

    // Organization
    pub static ref ORG_NETWORKS_TOTAL: GaugeVec = gauge!(
        "mt_org_networks_total", "Number of networks in the organization", &["organization_id"]);
    pub static ref ORG_DEVICES_TOTAL: GaugeVec = gauge!(
        "mt_org_devices_total", "Number of devices in the organization", &["organization_id"]);
    pub static ref ORG_DEVICES_TOTAL_BY_MODEL: GaugeVec = gauge!(
        "mt_org_devices_total_by_model", "Number of devices in the organization by model",
        &["organization_id", "model"]);
    pub static ref ORG_DEVICES_AVAILABILITY_TOTAL: GaugeVec = gauge!(
        "mt_org_devices_availability_total", "Number of devices by availability status",
        &["organization_id", "status"]);
    pub static ref ORG_API_REQUESTS_REMAINING: GaugeVec = gauge!(
        "mt_org_api_requests_remaining", "Remaining Dashboard API requests in the current window",
        &["organization_id"]);
    pub static ref ORG_LICENSE_STATE: GaugeVec = gauge!(
        "mt_org_license_state", "Organization license status (info metric, pinned to 1)",
        &["organization_id", "mode", "status"]);
    pub static ref ORG_LICENSE_EXPIRING_SOON: GaugeVec = gauge!(
        "mt_org_license_expiring_soon", "License expires within 30 days (1=yes)",
        &["organization_id"]);
    pub static ref ORG_LICENSE_SEATS_TOTAL: GaugeVec = gauge!(
        "mt_org_license_seats_total", "Total licensed seats or devices", &["organization_id"]);
    pub static ref ORG_LICENSE_SEATS_USED: GaugeVec = gauge!(
        "mt_org_license_seats_used", "Licensed seats or devices currently in use",
        &["organization_id"]);
    pub static ref ORG_CLIENTS_ONLINE_TOTAL: GaugeVec = gauge!(
        "mt_org_clients_online_total", "Number of clients currently online in the organization",
        &["organization_id"]);
    pub static ref ORG_CLIENTS_USAGE_BYTES: GaugeVec = gauge!(
        "mt_org_clients_usage_bytes", "Aggregate client traffic over the reporting window",
        &["organization_id", "direction"]);
    pub static ref ORG_APPLICATION_USAGE_BYTES: GaugeVec = gauge!(
        "mt_org_application_usage_bytes", "Traffic bytes by application category",
        &["organization_id", "category", "application"]);

    // Device (generic)
    pub static ref DEVICE_UP: GaugeVec = gauge!(
        "mt_device_up", "Device reachability as last reported by Dashboard (1=online)",
        &["network_id", "serial", "model"]);
    pub static ref DEVICE_STATUS_INFO: GaugeVec = gauge!(
        "mt_device_status_info", "Device identity info metric, pinned to 1",
        &["network_id", "serial", "model", "name", "status"]);
    pub static ref DEVICE_MEMORY_USED_PERCENT: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "mt_device_memory_used_percent",
            "Device memory utilization percentage",
            vec![10.0, 25.0, 50.0, 70.0, 80.0, 90.0, 95.0, 99.0]
        ),
        &["network_id", "serial"]
    ).unwrap();

    // MS
    pub static ref SWITCH_PORT_STATUS: GaugeVec = gauge!(
        "mt_switch_port_status", "Switch port link status (1=connected)",
        &["network_id", "serial", "port_id"]);
    pub static ref SWITCH_PORT_TRAFFIC_BYTES: GaugeVec = gauge!(
        "mt_switch_port_traffic_bytes", "Switch port traffic over the reporting window",
        &["network_id", "serial", "port_id", "direction"]);
    pub static ref SWITCH_POE_POWER_WATTS: GaugeVec = gauge!(
        "mt_switch_poe_power_watts", "PoE power currently drawn on a switch port",
        &["network_id", "serial", "port_id"]);

    // MR
    pub static ref WIRELESS_CLIENTS_CONNECTED: GaugeVec = gauge!(
        "mt_wireless_clients_connected", "Wireless clients currently connected to an AP",
        &["network_id", "serial"]);
    pub static ref WIRELESS_CHANNEL_UTILIZATION_PERCENT: GaugeVec = gauge!(
        "mt_wireless_channel_utilization_percent", "Radio channel utilization percentage",
        &["network_id", "serial", "band"]);
    pub static ref WIRELESS_SSID_USAGE_BYTES: GaugeVec = gauge!(
        "mt_wireless_ssid_usage_bytes", "Traffic bytes by SSID over the reporting window",
        &["network_id", "ssid"]);

    // MX
    pub static ref APPLIANCE_UPLINK_STATUS: GaugeVec = gauge!(
        "mt_appliance_uplink_status", "Appliance WAN uplink status (1=active)",
        &["network_id", "serial", "uplink"]);
    pub static ref APPLIANCE_VPN_STATUS: GaugeVec = gauge!(
        "mt_appliance_vpn_status", "Site-to-site VPN peer reachability (1=reachable)",
        &["network_id", "serial", "peer_network_id"]);

    // MV
    pub static ref CAMERA_STATUS: GaugeVec = gauge!(
        "mt_camera_status", "Camera online status (1=online)", &["network_id", "serial"]);

    // MG
    pub static ref CELLULAR_SIGNAL_QUALITY_PERCENT: GaugeVec = gauge!(
        "mt_cellular_signal_quality_percent", "Cellular gateway signal quality percentage",
        &["network_id", "serial"]);

    // Network health
    pub static ref NETWORK_RF_HEALTH_SCORE: GaugeVec = gauge!(
        "mt_network_rf_health_score", "Aggregate RF health score for the network",
        &["network_id"]);
    pub static ref NETWORK_CONNECTION_SUCCESS_PERCENT: GaugeVec = gauge!(
        "mt_network_connection_success_percent", "Client connection success rate",
        &["network_id", "stage"]);
    pub static ref NETWORK_DATA_RATE_BPS: GaugeVec = gauge!(
        "mt_network_data_rate_bps", "Average client data rate in bits per second",
        &["network_id", "direction"]);
    pub static ref NETWORK_BLUETOOTH_CLIENTS_TOTAL: GaugeVec = gauge!(
        "mt_network_bluetooth_clients_total", "Bluetooth-scannable clients observed in the network",
        &["network_id"]);

    // Alerts
    pub static ref ORG_ALERTS_TOTAL: GaugeVec = gauge!(
        "mt_org_alerts_total", "Active organization-wide alerts by type",
        &["organization_id", "alert_type", "severity"]);
    pub static ref NETWORK_HEALTH_ALERTS_TOTAL: GaugeVec = gauge!(
        "mt_network_health_alerts_total", "Active network health alerts by type",
        &["organization_id", "network_id", "alert_type", "severity"]);
    pub static ref SENSOR_ALERTS_TOTAL: GaugeVec = gauge!(
        "mt_sensor_alerts_total", "Active sensor alerts by type",
        &["organization_id", "network_id", "alert_type", "severity"]);

    // Clients (opt-in)
    pub static ref CLIENT_USAGE_BYTES: GaugeVec = gauge!(
        "mt_client_usage_bytes", "Per-network aggregated client traffic",
        &["network_id", "direction"]);
    pub static ref CLIENT_RSSI_DBM: GaugeVec = gauge!(
        "mt_client_rssi_dbm", "Average client RSSI observed in the network", &["network_id"]);
    pub static ref CLIENT_STATUS: GaugeVec = gauge!(
        "mt_client_status", "Per-network count of clients by connection status",
        &["network_id", "status"]);
    pub static ref CLIENT_SSID_COUNT: GaugeVec = gauge!(
        "mt_client_ssid_count", "Per-network count of clients by SSID", &["network_id", "ssid"]);
    pub static ref CLIENT_VLAN_COUNT: GaugeVec = gauge!(
        "mt_client_vlan_count", "Per-network count of clients by VLAN", &["network_id", "vlan"]);
    pub static ref CLIENT_DNS_CACHE_HITS_TOTAL: CounterVec = counter!(
        "mt_client_dns_cache_hits_total", "Reverse DNS cache hits while labeling client traffic",
        &["network_id"]);
    pub static ref CLIENT_DNS_CACHE_MISSES_TOTAL: CounterVec = counter!(
        "mt_client_dns_cache_misses_total", "Reverse DNS cache misses while labeling client traffic",
        &["network_id"]);
    pub static ref CLIENT_DNS_CACHE_EXPIRED_TOTAL: CounterVec = counter!(
        "mt_client_dns_cache_expired_total", "Reverse DNS cache entries evicted for exceeding their TTL",
        &["network_id"]);

    // Config
    pub static ref ORG_LOGIN_SECURITY_SETTING: GaugeVec = gauge!(
        "mt_org_login_security_setting", "Login security setting enabled (1=enabled)",
        &["organization_id", "setting"]);
    pub static ref ORG_LOGIN_SECURITY_THRESHOLD: GaugeVec = gauge!(
        "mt_org_login_security_threshold", "Login security numeric threshold",
        &["organization_id", "setting"]);
    pub static ref ORG_CONFIG_CHANGES_24H_TOTAL: GaugeVec = gauge!(
        "mt_org_config_changes_24h_total", "Configuration changes recorded in the last 24 hours",
        &["organization_id"]);

    // Exporter self-instrumentation
    pub static ref EXPORTER_COLLECTOR_RUNS_TOTAL: CounterVec = counter!(
        "exporter_collector_runs_total", "Collector runs attempted", &["collector", "tier"]);
    pub static ref EXPORTER_COLLECTOR_ERRORS_TOTAL: CounterVec = counter!(
        "exporter_collector_errors_total", "Collector runs that failed, by error category",
        &["collector", "tier", "category"]);
    pub static ref EXPORTER_COLLECTOR_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "exporter_collector_duration_seconds",
            "Collector run duration",
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        ),
        &["collector", "tier"]
    ).unwrap();
    pub static ref EXPORTER_COLLECTOR_LAST_SUCCESS_TIMESTAMP: GaugeVec = gauge!(
        "exporter_collector_last_success_timestamp_seconds",
        "Unix timestamp of the collector's last successful run", &["collector", "tier"]);
    pub static ref EXPORTER_SERIES_EXPIRED_TOTAL: CounterVec = counter!(
        "exporter_series_expired_total", "Metric series reaped for exceeding their TTL",
        &["tier"]);
    pub static ref ORG_COLLECTION_WAIT_TIME_SECONDS: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "org_collection_wait_time_seconds",
            "Time a per-org fan-out batch spent queued behind the concurrency limit",
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        ),
        &["collector", "tier"]
    ).unwrap();
    pub static ref COLLECTOR_FAILURE_STREAK: GaugeVec = gauge!(
        "collector_failure_streak", "Consecutive failed runs for a collector, reset on success",
        &["collector", "tier"]);
    pub static ref COLLECTOR_LAST_SUCCESS_AGE_SECONDS: GaugeVec = gauge!(
        "collector_last_success_age_seconds",
        "Seconds since a collector's last successful run, as of its most recent run",
        &["collector", "tier"]);
    pub static ref COLLECTOR_API_CALLS_TOTAL: CounterVec = counter!(
        "collector_api_calls_total", "Upstream API calls made by a collector, by endpoint",
        &["collector", "tier", "endpoint"]);

    // Client self-instrumentation (spec.md 4.1). Continuously active,
    // not entity-scoped, so these bypass the TTL-reaped MetricRegistry
    // and are written directly by the client.
    pub static ref API_REQUESTS_TOTAL: CounterVec = counter!(
        "api_requests_total", "Upstream API calls by endpoint, method and status code",
        &["endpoint", "method", "status_code"]);
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        histogram_opts!(
            "api_request_duration_seconds",
            "Upstream API call latency",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
        ),
        &["endpoint", "method", "status_code"]
    ).unwrap();
    pub static ref API_RETRY_ATTEMPTS_TOTAL: CounterVec = counter!(
        "api_retry_attempts_total", "Upstream API retries by endpoint and reason",
        &["endpoint", "retry_reason"]);
    pub static ref API_RATE_LIMIT_REMAINING: GaugeVec = gauge!(
        "api_rate_limit_remaining", "Remaining upstream rate-limit budget, when exposed",
        &["org_id"]);
    pub static ref API_RATE_LIMIT_TOTAL: GaugeVec = gauge!(
        "api_rate_limit_total", "Total upstream rate-limit budget, when exposed",
        &["org_id"]);
}

/// Register every metric into the global registry. Idempotent to call
/// more than once only in tests; production calls it exactly once at
/// startup.
pub fn register_all() {
    macro_rules! reg {
        ($($metric:expr),* $(,)?) => {
            $(let _ = REGISTRY.register(Box::new($metric.clone()));)*
        };
    }

    reg!(
        SENSOR_TEMPERATURE_CELSIUS, SENSOR_HUMIDITY_PERCENT, SENSOR_DOOR_OPEN, SENSOR_WATER_DETECTED,
        SENSOR_CO2_PPM, SENSOR_TVOC_PPB, SENSOR_PM25_UGM3, SENSOR_NOISE_DB, SENSOR_BATTERY_PERCENT,
        SENSOR_INDOOR_AIR_QUALITY_SCORE, SENSOR_VOLTAGE_VOLTS, SENSOR_CURRENT_AMPS,
        SENSOR_REAL_POWER_WATTS, SENSOR_APPARENT_POWER_VA, SENSOR_POWER_FACTOR_PERCENT,
        SENSOR_FREQUENCY_HZ, SENSOR_DOWNSTREAM_POWER_ENABLED, SENSOR_REMOTE_LOCKOUT_ENABLED,
        ORG_NETWORKS_TOTAL, ORG_DEVICES_TOTAL, ORG_DEVICES_TOTAL_BY_MODEL, ORG_DEVICES_AVAILABILITY_TOTAL,
        ORG_API_REQUESTS_REMAINING, ORG_LICENSE_STATE, ORG_LICENSE_EXPIRING_SOON,
        ORG_LICENSE_SEATS_TOTAL, ORG_LICENSE_SEATS_USED, ORG_CLIENTS_ONLINE_TOTAL,
        ORG_CLIENTS_USAGE_BYTES, ORG_APPLICATION_USAGE_BYTES,
        DEVICE_UP, DEVICE_STATUS_INFO, DEVICE_MEMORY_USED_PERCENT,
        SWITCH_PORT_STATUS, SWITCH_PORT_TRAFFIC_BYTES, SWITCH_POE_POWER_WATTS,
        WIRELESS_CLIENTS_CONNECTED, WIRELESS_CHANNEL_UTILIZATION_PERCENT, WIRELESS_SSID_USAGE_BYTES,
        APPLIANCE_UPLINK_STATUS, APPLIANCE_VPN_STATUS,
        CAMERA_STATUS,
        CELLULAR_SIGNAL_QUALITY_PERCENT,
        NETWORK_RF_HEALTH_SCORE, NETWORK_CONNECTION_SUCCESS_PERCENT, NETWORK_DATA_RATE_BPS,
        NETWORK_BLUETOOTH_CLIENTS_TOTAL,
        ORG_ALERTS_TOTAL, NETWORK_HEALTH_ALERTS_TOTAL, SENSOR_ALERTS_TOTAL,
        CLIENT_USAGE_BYTES, CLIENT_RSSI_DBM, CLIENT_STATUS, CLIENT_SSID_COUNT, CLIENT_VLAN_COUNT,
        CLIENT_DNS_CACHE_HITS_TOTAL, CLIENT_DNS_CACHE_MISSES_TOTAL, CLIENT_DNS_CACHE_EXPIRED_TOTAL,
        ORG_LOGIN_SECURITY_SETTING, ORG_LOGIN_SECURITY_THRESHOLD, ORG_CONFIG_CHANGES_24H_TOTAL,
        EXPORTER_COLLECTOR_RUNS_TOTAL, EXPORTER_COLLECTOR_ERRORS_TOTAL,
        EXPORTER_COLLECTOR_DURATION_SECONDS, EXPORTER_COLLECTOR_LAST_SUCCESS_TIMESTAMP,
        EXPORTER_SERIES_EXPIRED_TOTAL,
        API_REQUESTS_TOTAL, API_REQUEST_DURATION_SECONDS, API_RETRY_ATTEMPTS_TOTAL,
        API_RATE_LIMIT_REMAINING, API_RATE_LIMIT_TOTAL,
        ORG_COLLECTION_WAIT_TIME_SECONDS, COLLECTOR_FAILURE_STREAK, COLLECTOR_LAST_SUCCESS_AGE_SECONDS,
        COLLECTOR_API_CALLS_TOTAL,
    );
}
