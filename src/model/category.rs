//! Pollen and spore classes offered for manually drawn boxes.

/// Default label vocabulary, in the order the front end lists it.
pub const POLLEN_CLASSES: &[&str] = &[
    "Alnus",
    "Artemisia",
    "Betula",
    "Carpinus",
    "Corylus",
    "Cyperaceae",
    "Fagus",
    "Fraxinus",
    "Juglans",
    "Larix",
    "Papaveraceae",
    "Picea",
    "Pinaceae",
    "Plantago",
    "Platanus",
    "Poaceae",
    "Populus",
    "Rumex",
    "Salix",
    "Taxus",
    "Tilia",
    "Ulmus",
    "Urticaceae",
    "Quercus",
    "Sporen",
    "NoPollen",
    "Varia",
    "Pinus",
    "Acer",
    "Asteraceae",
    "Thalictrum",
    "Cyperacea",
    "Fabaceae",
    "Sambucus",
    "Ambrosia",
    "Tsuga",
    "Juncaceae",
    "Impatiens",
    "Ericaceae",
    "Brassicaceae",
    "Cladosporium",
    "Alternaria",
];

/// The default vocabulary as owned strings.
pub fn default_vocabulary() -> Vec<String> {
    POLLEN_CLASSES.iter().map(|c| c.to_string()).collect()
}
