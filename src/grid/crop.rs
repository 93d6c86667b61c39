//! Slicing a composite raster into a grid of fixed-size crops.

use ndarray::{ArrayView2, Axis, Slice};

use crate::data::Raster;
use crate::grid::naming::{DirectoryName, ImageType, tile_path};
use crate::grid::{GridConfig, GridError};
use crate::labels::LabelTable;
use crate::model::LabeledBox;

/// Position of a crop in the grid, by index and by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Column index, 0 at the left edge of the raster.
    pub column: usize,
    /// Row index, 0 at the top edge of the raster.
    pub row: usize,
    pub horizontal_label: i32,
    pub vertical_label: i32,
}

/// Grid cells in generation order: columns left to right, and within each
/// column rows top to bottom.
pub fn generation_order(
    horizontal_tiles: usize,
    vertical_tiles: usize,
    label_end: i32,
    top_vertical_label: i32,
) -> Vec<GridCell> {
    let mut cells = Vec::with_capacity(horizontal_tiles * vertical_tiles);
    for column in 0..horizontal_tiles {
        for row in 0..vertical_tiles {
            cells.push(GridCell {
                column,
                row,
                horizontal_label: label_end - column as i32,
                vertical_label: top_vertical_label - row as i32,
            });
        }
    }
    cells
}

/// The order crops are presented and indexed in: generation order reversed.
///
/// Persisted crop indices refer to this order.
pub fn presentation_order(mut cells: Vec<GridCell>) -> Vec<GridCell> {
    cells.reverse();
    cells
}

/// One crop of a probe directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub cell: GridCell,
    /// Display name (`...-tiffRAW.png`).
    pub name: String,
    /// Name of the source tiff, the join key into the label table.
    pub label_key: String,
    /// Boxes from the label table, in table order.
    pub existing_boxes: Vec<LabeledBox>,
}

/// A probe directory's raster together with its crops in presentation order.
#[derive(Debug, Clone)]
pub struct TiledRaster {
    directory: String,
    raster: Raster,
    tile_width: usize,
    tile_height: usize,
    tiles: Vec<Tile>,
}

impl TiledRaster {
    /// Cut `raster` into crops and attach each crop's existing boxes from `labels`.
    ///
    /// Rows and columns that do not fill a whole crop are discarded.
    pub fn compute(
        raster: Raster,
        directory: &str,
        labels: &LabelTable,
        config: &GridConfig,
    ) -> Result<Self, GridError> {
        let name = DirectoryName::parse(directory)?;
        let (tile_width, tile_height) = (config.tile_width, config.tile_height);
        if tile_width == 0 || tile_height == 0 {
            return Err(GridError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
            });
        }

        let vertical_tiles = raster.nrows() / tile_height;
        let horizontal_tiles = raster.ncols() / tile_width;
        let label_end = config.label_end_for(directory, horizontal_tiles);

        let cells = generation_order(
            horizontal_tiles,
            vertical_tiles,
            label_end,
            config.top_vertical_label,
        );
        let tiles = presentation_order(cells)
            .into_iter()
            .map(|cell| {
                let label_key = name.tile_name(
                    cell.horizontal_label,
                    cell.vertical_label,
                    ImageType::Tif,
                    &config.pmon,
                );
                Tile {
                    cell,
                    name: name.tile_name(
                        cell.horizontal_label,
                        cell.vertical_label,
                        ImageType::Raw,
                        &config.pmon,
                    ),
                    existing_boxes: labels.lookup(&label_key),
                    label_key,
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Cut {} into {} crops ({} x {}, label end {})",
            directory,
            tiles.len(),
            horizontal_tiles,
            vertical_tiles,
            label_end
        );

        Ok(Self {
            directory: directory.to_string(),
            raster,
            tile_width,
            tile_height,
            tiles,
        })
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Session key of the crop at `index`: `<directory>/images/<name>`.
    pub fn tile_path(&self, index: usize) -> Option<String> {
        self.tile(index)
            .map(|tile| tile_path(&self.directory, &tile.name))
    }

    /// Pixels of the crop at `index`, borrowed from the raster.
    pub fn crop(&self, index: usize) -> Option<ArrayView2<'_, u16>> {
        let cell = self.tile(index)?.cell;
        let top = cell.row * self.tile_height;
        let left = cell.column * self.tile_width;
        Some(
            self.raster
                .view()
                .slice_axis_move(Axis(0), Slice::from(top..top + self.tile_height))
                .slice_axis_move(Axis(1), Slice::from(left..left + self.tile_width)),
        )
    }

    /// Whether the crop at `index` has a single uniform pixel value.
    pub fn is_blank(&self, index: usize) -> bool {
        self.crop(index).is_some_and(|crop| {
            let mut pixels = crop.iter();
            match pixels.next() {
                Some(&first) => pixels.all(|&p| p == first),
                None => true,
            }
        })
    }

    /// All crops with their pixels, in presentation order.
    pub fn crops(&self) -> impl Iterator<Item = (&Tile, ArrayView2<'_, u16>)> {
        (0..self.tiles.len()).filter_map(|i| Some((self.tile(i)?, self.crop(i)?)))
    }
}
