// SPDX-License-Identifier: MPL-2.0

use dic::{Buffer, DefMap, Error, Image, InitMode, Interpolation, Subset};

/// Deterministic pseudo-random 8 bits speckle pattern.
fn speckle(width: usize, height: usize) -> Image {
    Image::from_fn(width, height, |x, y| {
        let h = (x as u32)
            .wrapping_mul(73_856_093)
            .wrapping_add((y as u32).wrapping_mul(19_349_663))
            .rotate_left(13)
            .wrapping_mul(83_492_791);
        (h >> 24) as f32
    })
    .expect("valid image")
}

#[test]
fn rectangular_subset_samples_reference_and_shifted_deformed() {
    let image = speckle(400, 350);
    let mut square = Subset::rectangle(125, 250, 13, 19).expect("valid subset");
    assert_eq!(square.num_pixels(), 247);
    assert_eq!(square.centroid_x(), 125);
    assert_eq!(square.centroid_y(), 250);

    square.initialize(&image).expect("subset inside image");
    for i in 0..square.num_pixels() {
        let expected = image.at(square.x(i).unwrap(), square.y(i).unwrap()).unwrap();
        assert_eq!(square.ref_intensities(i).unwrap(), expected);
    }

    let map = DefMap::translation(200.0, 50.0);
    square
        .initialize_with_map(&image, &map, InitMode::FillDefIntensities)
        .expect("shifted subset inside image");
    for i in 0..square.num_pixels() {
        let expected = image
            .at(square.x(i).unwrap() + 200, square.y(i).unwrap() + 50)
            .unwrap();
        assert_eq!(square.def_intensities(i).unwrap(), expected);
    }
    // The reference buffer is untouched by deformed initializations.
    assert_eq!(
        square.ref_intensities(0).unwrap(),
        image.at(square.x(0).unwrap(), square.y(0).unwrap()).unwrap()
    );
}

#[test]
fn array_subset_keeps_points_and_centroid() {
    let xs: Vec<i32> = (0..48).map(|i| i * 2 + 4).collect();
    let ys: Vec<i32> = (0..48).map(|i| 42 + i).collect();
    let array = Subset::from_coordinates(125, 250, &xs, &ys).expect("valid subset");
    assert_eq!(array.num_pixels(), 48);
    assert_eq!(array.centroid_x(), 125);
    assert_eq!(array.centroid_y(), 250);
    for i in 0..48 {
        assert_eq!(array.x(i).unwrap(), 2 * i as i32 + 4);
        assert_eq!(array.y(i).unwrap(), 42 + i as i32);
    }
    assert!(matches!(
        array.x(48),
        Err(Error::IndexOutOfRange { index: 48, len: 48 })
    ));
}

#[test]
fn deformed_sampling_uses_a_separate_deformed_image() {
    let reference = speckle(120, 100);
    // The deformed image is the reference moved by (+3, -2).
    let deformed = Image::from_fn(120, 100, |x, y| {
        let (x, y) = (x as i32 - 3, y as i32 + 2);
        reference.at(x, y).unwrap_or(0.0)
    })
    .expect("valid image");

    for &interp in &[
        Interpolation::Nearest,
        Interpolation::Bilinear,
        Interpolation::Cubic,
    ] {
        let mut s = Subset::rectangle(60, 50, 21, 21)
            .expect("valid subset")
            .with_interpolation(interp);
        s.initialize(&reference).unwrap();
        s.initialize_with_map(&deformed, &DefMap::translation(3.0, -2.0), InitMode::FillDefIntensities)
            .unwrap();
        assert_eq!(s.ref_buffer().unwrap(), s.def_buffer().unwrap());
        assert!(s.gamma().unwrap() < 1e-6);

        // A wrong guess correlates worse.
        s.initialize_with_map(&deformed, &DefMap::translation(2.0, -2.0), InitMode::FillDefIntensities)
            .unwrap();
        assert!(s.gamma().unwrap() > 0.1);
    }
}

#[test]
fn out_of_bounds_map_leaves_buffers_unchanged() {
    let image = speckle(64, 64);
    let mut s = Subset::rectangle(32, 32, 9, 9).expect("valid subset");
    s.initialize(&image).unwrap();
    s.initialize_with_map(&image, &DefMap::translation(0.5, 0.5), InitMode::FillDefIntensities)
        .unwrap();
    let def_before = s.def_buffer().unwrap().to_vec();

    let err = s
        .initialize_with_map(&image, &DefMap::translation(0.0, -29.0), InitMode::FillDefIntensities)
        .unwrap_err();
    assert!(matches!(err, Error::SampleOutOfBounds { .. }));
    assert_eq!(s.def_buffer().unwrap(), def_before.as_slice());
}

#[test]
fn subsets_are_written_as_bounding_box_images() {
    let image = speckle(80, 80);
    let mut s = Subset::rectangle(40, 40, 5, 7).expect("valid subset");
    s.initialize(&image).unwrap();

    let dir = std::env::temp_dir().join("dic_subset_write_test");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let def_path = dir.join("square_def.tif");
    assert!(matches!(
        s.write(&def_path, true),
        Err(Error::UninitializedAccess(Buffer::Deformed))
    ));

    s.initialize_with_map(&image, &DefMap::translation(10.0, 5.0), InitMode::FillDefIntensities)
        .unwrap();
    let ref_path = dir.join("square_ref.tif");
    s.write(&ref_path, false).expect("written");
    s.write(&def_path, true).expect("written");

    let ref_img = Image::load(&ref_path).expect("readable");
    assert_eq!((ref_img.width(), ref_img.height()), (5, 7));
    assert_eq!(ref_img.intensities(), s.ref_buffer().unwrap());
    let def_img = Image::load(&def_path).expect("readable");
    assert_eq!(def_img.intensities(), s.def_buffer().unwrap());
}
