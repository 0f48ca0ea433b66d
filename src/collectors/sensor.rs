//! FAST tier: per-organization MT sensor readings.

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::EndpointId;
use crate::error::Result;
use crate::metrics::MetricHandle;
use crate::types::{MetricSample, Tier};

use super::{Collector, CollectorContext, CollectorFactory};

pub struct SensorCollector;

inventory::submit! { CollectorFactory(|| Box::new(SensorCollector)) }

#[derive(Deserialize)]
struct SensorReading {
    serial: String,
    network: ReadingNetwork,
    readings: Vec<Reading>,
}

#[derive(Deserialize)]
struct ReadingNetwork {
    id: String,
}

#[derive(Deserialize)]
struct Reading {
    metric: String,
    #[serde(default)]
    temperature: Option<ValueCelsius>,
    #[serde(default)]
    humidity: Option<ValuePercent>,
    #[serde(default)]
    door: Option<ValueOpen>,
    #[serde(default)]
    water: Option<ValuePresent>,
    #[serde(default)]
    co2: Option<ValueConcentration>,
    #[serde(default)]
    tvoc: Option<ValueConcentration>,
    #[serde(default)]
    pm25: Option<ValueConcentration>,
    #[serde(default)]
    noise: Option<NoiseAmbient>,
    #[serde(default)]
    battery: Option<ValuePercent>,
    #[serde(default)]
    indoor_air_quality: Option<ValueScore>,
    #[serde(default)]
    voltage: Option<ValueLevel>,
    #[serde(default)]
    current: Option<ValueLevel>,
    #[serde(default)]
    real_power: Option<ValueDraw>,
    #[serde(default)]
    apparent_power: Option<ValueDraw>,
    #[serde(default)]
    power_factor: Option<ValuePercent>,
    #[serde(default)]
    frequency: Option<ValueLevel>,
    #[serde(default)]
    remote_lockout_switch: Option<ValueOpen>,
    #[serde(default, rename = "downstreamPower")]
    downstream_power: Option<ValueEnabled>,
}

#[derive(Deserialize)]
struct ValueEnabled {
    enabled: bool,
}

#[derive(Deserialize)]
struct ValueCelsius {
    celsius: f64,
}
#[derive(Deserialize)]
struct ValuePercent {
    percentage: f64,
}
#[derive(Deserialize)]
struct ValueOpen {
    open: bool,
}
#[derive(Deserialize)]
struct ValuePresent {
    present: bool,
}
#[derive(Deserialize)]
struct ValueConcentration {
    concentration: f64,
}
#[derive(Deserialize)]
struct NoiseAmbient {
    ambient: ValueDb,
}
#[derive(Deserialize)]
struct ValueDb {
    level: f64,
}
#[derive(Deserialize)]
struct ValueScore {
    score: f64,
}
#[derive(Deserialize)]
struct ValueLevel {
    level: f64,
}
#[derive(Deserialize)]
struct ValueDraw {
    draw: f64,
}

#[async_trait]
impl Collector for SensorCollector {
    fn name(&self) -> &'static str {
        "sensor"
    }

    fn tier(&self) -> Tier {
        Tier::Fast
    }

    async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<MetricSample>> {
        let mut samples = Vec::new();

        for org in ctx.inventory.organizations().await?.iter() {
            let path = format!("/organizations/{}/sensor/readings/latest", org.id);
            super::track_api_call(self.name(), self.tier(), EndpointId::SensorReadings.as_label());
            let readings: Vec<SensorReading> =
                match ctx.client.get_json_paginated(&path, EndpointId::SensorReadings).await {
                    Ok(r) => r,
                    Err(e) if e.category() == crate::error::ErrorCategory::NotAvailable => continue,
                    Err(e) => {
                        super::isolate_error(self.name(), self.tier(), &e);
                        continue;
                    }
                };

            for reading in readings {
                let network_id = reading.network.id.clone();
                let serial = reading.serial.clone();
                let labels = || vec![network_id.clone(), serial.clone()];

                for r in &reading.readings {
                    match r.metric.as_str() {
                        "temperature" => {
                            if let Some(v) = &r.temperature {
                                samples.push(MetricSample::new(MetricHandle::SensorTemperatureCelsius, labels(), v.celsius));
                            }
                        }
                        "humidity" => {
                            if let Some(v) = &r.humidity {
                                samples.push(MetricSample::new(MetricHandle::SensorHumidityPercent, labels(), v.percentage));
                            }
                        }
                        "door" => {
                            if let Some(v) = &r.door {
                                samples.push(MetricSample::new(MetricHandle::SensorDoorOpen, labels(), v.open as u8 as f64));
                            }
                        }
                        "water" => {
                            if let Some(v) = &r.water {
                                samples.push(MetricSample::new(MetricHandle::SensorWaterDetected, labels(), v.present as u8 as f64));
                            }
                        }
                        "co2" => {
                            if let Some(v) = &r.co2 {
                                samples.push(MetricSample::new(MetricHandle::SensorCo2Ppm, labels(), v.concentration));
                            }
                        }
                        "tvoc" => {
                            if let Some(v) = &r.tvoc {
                                samples.push(MetricSample::new(MetricHandle::SensorTvocPpb, labels(), v.concentration));
                            }
                        }
                        "pm25" => {
                            if let Some(v) = &r.pm25 {
                                samples.push(MetricSample::new(MetricHandle::SensorPm25Ugm3, labels(), v.concentration));
                            }
                        }
                        "noise" => {
                            if let Some(v) = &r.noise {
                                samples.push(MetricSample::new(MetricHandle::SensorNoiseDb, labels(), v.ambient.level));
                            }
                        }
                        "battery" => {
                            if let Some(v) = &r.battery {
                                samples.push(MetricSample::new(MetricHandle::SensorBatteryPercent, labels(), v.percentage));
                            }
                        }
                        "indoorAirQuality" => {
                            if let Some(v) = &r.indoor_air_quality {
                                samples.push(MetricSample::new(MetricHandle::SensorIndoorAirQualityScore, labels(), v.score));
                            }
                        }
                        "voltage" => {
                            if let Some(v) = &r.voltage {
                                samples.push(MetricSample::new(MetricHandle::SensorVoltageVolts, labels(), v.level));
                            }
                        }
                        "current" => {
                            if let Some(v) = &r.current {
                                samples.push(MetricSample::new(MetricHandle::SensorCurrentAmps, labels(), v.level));
                            }
                        }
                        "realPower" => {
                            if let Some(v) = &r.real_power {
                                samples.push(MetricSample::new(MetricHandle::SensorRealPowerWatts, labels(), v.draw));
                            }
                        }
                        "apparentPower" => {
                            if let Some(v) = &r.apparent_power {
                                samples.push(MetricSample::new(MetricHandle::SensorApparentPowerVa, labels(), v.draw));
                            }
                        }
                        "powerFactor" => {
                            if let Some(v) = &r.power_factor {
                                samples.push(MetricSample::new(MetricHandle::SensorPowerFactorPercent, labels(), v.percentage));
                            }
                        }
                        "frequency" => {
                            if let Some(v) = &r.frequency {
                                samples.push(MetricSample::new(MetricHandle::SensorFrequencyHz, labels(), v.level));
                            }
                        }
                        "remoteLockoutSwitch" => {
                            if let Some(v) = &r.remote_lockout_switch {
                                samples.push(MetricSample::new(MetricHandle::SensorRemoteLockoutEnabled, labels(), v.open as u8 as f64));
                            }
                        }
                        "downstreamPower" => {
                            if let Some(v) = &r.downstream_power {
                                samples.push(MetricSample::new(MetricHandle::SensorDownstreamPowerEnabled, labels(), v.enabled as u8 as f64));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(samples)
    }
}
