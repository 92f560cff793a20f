//! Shared application state threaded through every HTTP handler via axum's
//! `State` extractor. Ground: `devolutions-gateway`'s `DgwState`, a cheap
//! `Clone` bundle of `Arc`-backed subsystems handed to every router.

use std::sync::Arc;

use crate::clients::commodore::CommodoreClient;
use crate::clients::foghorn::FoghornClient;
use crate::clients::geoip::GeoIpLookup;
use crate::config::Conf;
use crate::metrics::Metrics;
use crate::node::NodeStore;
use crate::pipeline::EventProducer;

#[derive(Clone)]
pub struct AppState {
    pub conf: Arc<Conf>,
    pub commodore: CommodoreClient,
    pub foghorn: FoghornClient,
    pub geoip: Arc<GeoIpLookup>,
    pub events: EventProducer,
    pub node: NodeStore,
    pub metrics: Metrics,
}
