//! Single interface for registering all of the [`Config`]s for `cljb`.
//!
//! [`Config`]: cljb_cfg::Config

use cljb_cfg::ConfigSetBuilder;

use crate::defs::{BUILD_DIR, PROJECT_FILENAME, RESOURCES_DIR, STRICT_PLUGINS, VERSION_RESOURCE};

pub fn all_cfgs(builder: &mut ConfigSetBuilder) {
    builder
        .register(&PROJECT_FILENAME)
        .register(&BUILD_DIR)
        .register(&VERSION_RESOURCE)
        .register(&RESOURCES_DIR)
        .register(&STRICT_PLUGINS);
}
